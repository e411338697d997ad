use bevy::{
    math::{Quat, Vec3},
    reflect::Reflect,
};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// One flag per property of [`CameraPose`].
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct CameraPoseFlags: u32 {
        const LOCATION = 1 << 0;
        const ROTATION = 1 << 1;
        const TARGET_DISTANCE = 1 << 2;
        const FIELD_OF_VIEW = 1 << 3;
        const FOCAL_LENGTH = 1 << 4;
        const APERTURE = 1 << 5;
        const FOCUS_DISTANCE = 1 << 6;
        const SENSOR_WIDTH = 1 << 7;
        const SENSOR_HEIGHT = 1 << 8;
        const NEAR_CLIPPING_PLANE = 1 << 9;
        const FAR_CLIPPING_PLANE = 1 << 10;
        const ORTHOGRAPHIC_WIDTH = 1 << 11;
        const PROJECTION_MODE = 1 << 12;
        const CONSTRAIN_ASPECT_RATIO = 1 << 13;

        /// Properties that switch from one value to the other half-way through a blend
        const FLIPPING = Self::PROJECTION_MODE.bits() | Self::CONSTRAIN_ASPECT_RATIO.bits();
    }
}

#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

macro_rules! camera_pose_properties {
    ($($name:ident : $ty:ty => $flag:ident, $setter:ident;)*) => {
        impl CameraPose {
            $(
                pub fn $name(&self) -> $ty {
                    self.$name
                }

                /// Sets the property, flagging it as changed if the value differs.
                pub fn $setter(&mut self, value: $ty) {
                    if self.$name != value {
                        self.$name = value;
                        self.changed_flags |= CameraPoseFlags::$flag;
                    }
                }
            )*

            fn copy_property(&mut self, other: &CameraPose, flag: CameraPoseFlags) {
                $(
                    if flag == CameraPoseFlags::$flag {
                        self.$setter(other.$name);
                    }
                )*
            }
        }
    };
}

/// State of a camera: transform, lens and projection.
///
/// Fields can only be mutated through setters, which keep track of what changed since the last
/// call to [`CameraPose::clear_changed_flags`].
#[derive(Reflect, Clone, Debug, PartialEq)]
pub struct CameraPose {
    location: Vec3,
    rotation: Quat,
    target_distance: f32,
    field_of_view: f32,
    focal_length: f32,
    aperture: f32,
    focus_distance: f32,
    sensor_width: f32,
    sensor_height: f32,
    near_clipping_plane: f32,
    far_clipping_plane: f32,
    orthographic_width: f32,
    projection_mode: CameraProjectionMode,
    constrain_aspect_ratio: bool,

    #[reflect(ignore)]
    changed_flags: CameraPoseFlags,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            target_distance: 1000.,
            field_of_view: 90.,
            focal_length: -1.,
            aperture: 2.8,
            focus_distance: -1.,
            sensor_width: 24.89,
            sensor_height: 18.67,
            near_clipping_plane: 0.1,
            far_clipping_plane: 1000.,
            orthographic_width: 512.,
            projection_mode: CameraProjectionMode::Perspective,
            constrain_aspect_ratio: false,
            changed_flags: CameraPoseFlags::empty(),
        }
    }
}

camera_pose_properties! {
    location: Vec3 => LOCATION, set_location;
    rotation: Quat => ROTATION, set_rotation;
    target_distance: f32 => TARGET_DISTANCE, set_target_distance;
    field_of_view: f32 => FIELD_OF_VIEW, set_field_of_view;
    focal_length: f32 => FOCAL_LENGTH, set_focal_length;
    aperture: f32 => APERTURE, set_aperture;
    focus_distance: f32 => FOCUS_DISTANCE, set_focus_distance;
    sensor_width: f32 => SENSOR_WIDTH, set_sensor_width;
    sensor_height: f32 => SENSOR_HEIGHT, set_sensor_height;
    near_clipping_plane: f32 => NEAR_CLIPPING_PLANE, set_near_clipping_plane;
    far_clipping_plane: f32 => FAR_CLIPPING_PLANE, set_far_clipping_plane;
    orthographic_width: f32 => ORTHOGRAPHIC_WIDTH, set_orthographic_width;
    projection_mode: CameraProjectionMode => PROJECTION_MODE, set_projection_mode;
    constrain_aspect_ratio: bool => CONSTRAIN_ASPECT_RATIO, set_constrain_aspect_ratio;
}

impl CameraPose {
    pub fn changed_flags(&self) -> CameraPoseFlags {
        self.changed_flags
    }

    pub fn set_changed_flags(&mut self, flags: CameraPoseFlags) {
        self.changed_flags = flags;
    }

    pub fn clear_changed_flags(&mut self) {
        self.changed_flags = CameraPoseFlags::empty();
    }

    /// Resets all properties to their default values, with no changed flags.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Field of view in degrees, derived from the focal length when one is set.
    pub fn effective_field_of_view(&self) -> f32 {
        if self.focal_length > 0. {
            2. * (self.sensor_width / (2. * self.focal_length))
                .atan()
                .to_degrees()
        } else {
            self.field_of_view
        }
    }

    /// Direction the camera is looking at.
    pub fn aim_direction(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Location the camera is focused on, `target_distance` units in front of it.
    pub fn target(&self) -> Vec3 {
        self.location + self.aim_direction() * self.target_distance
    }

    /// Copies every property flagged as changed in `other`.
    pub fn override_changed(&mut self, other: &CameraPose) {
        for flag in other.changed_flags.iter() {
            self.copy_property(other, flag);
        }
    }

    /// Copies every property of `other`, flagging all of them as changed.
    pub fn override_all(&mut self, other: &CameraPose) {
        for flag in CameraPoseFlags::all().iter() {
            self.copy_property(other, flag);
        }
        self.changed_flags |= other.changed_flags;
    }

    /// Interpolates towards `other` for every property flagged as changed in `other`.
    ///
    /// Continuous properties are blended (rotation uses spherical interpolation), flipping
    /// properties switch over once `factor` reaches one half.
    pub fn lerp_changed(&mut self, other: &CameraPose, factor: f32) {
        if factor <= 0. {
            return;
        }
        if factor >= 1. {
            self.override_changed(other);
            return;
        }

        let changed = other.changed_flags;
        let lerp = |a: f32, b: f32| a + (b - a) * factor;

        if changed.contains(CameraPoseFlags::LOCATION) {
            self.set_location(self.location.lerp(other.location, factor));
        }
        if changed.contains(CameraPoseFlags::ROTATION) {
            self.set_rotation(self.rotation.slerp(other.rotation, factor));
        }
        if changed.contains(CameraPoseFlags::TARGET_DISTANCE) {
            self.set_target_distance(lerp(self.target_distance, other.target_distance));
        }
        if changed.intersects(CameraPoseFlags::FIELD_OF_VIEW | CameraPoseFlags::FOCAL_LENGTH) {
            // Blend the effective field of view, lenses with different focal lengths and
            // sensors would otherwise not be comparable.
            let fov = lerp(
                self.effective_field_of_view(),
                other.effective_field_of_view(),
            );
            self.set_field_of_view(fov);
            self.set_focal_length(-1.);
        }
        if changed.contains(CameraPoseFlags::APERTURE) {
            self.set_aperture(lerp(self.aperture, other.aperture));
        }
        if changed.contains(CameraPoseFlags::FOCUS_DISTANCE) {
            self.set_focus_distance(lerp(self.focus_distance, other.focus_distance));
        }
        if changed.contains(CameraPoseFlags::SENSOR_WIDTH) {
            self.set_sensor_width(lerp(self.sensor_width, other.sensor_width));
        }
        if changed.contains(CameraPoseFlags::SENSOR_HEIGHT) {
            self.set_sensor_height(lerp(self.sensor_height, other.sensor_height));
        }
        if changed.contains(CameraPoseFlags::NEAR_CLIPPING_PLANE) {
            self.set_near_clipping_plane(lerp(
                self.near_clipping_plane,
                other.near_clipping_plane,
            ));
        }
        if changed.contains(CameraPoseFlags::FAR_CLIPPING_PLANE) {
            self.set_far_clipping_plane(lerp(self.far_clipping_plane, other.far_clipping_plane));
        }
        if changed.contains(CameraPoseFlags::ORTHOGRAPHIC_WIDTH) {
            self.set_orthographic_width(lerp(self.orthographic_width, other.orthographic_width));
        }

        if factor >= 0.5 {
            for flag in (changed & CameraPoseFlags::FLIPPING).iter() {
                self.copy_property(other, flag);
            }
        }
    }
}
