use bevy::prelude::*;

use crate::{
    evaluation::CameraNodeEvaluationResult, pose::CameraPose, variable_table::CameraVariableTable,
};

pub trait InterpolateLinear {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self;
}

impl InterpolateLinear for f32 {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        self + (other - self) * f
    }
}

impl InterpolateLinear for Vec2 {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        self.lerp(*other, f)
    }
}

impl InterpolateLinear for Vec3 {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        self.lerp(*other, f)
    }
}

impl InterpolateLinear for Quat {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        self.slerp(*other, f)
    }
}

impl InterpolateLinear for Transform {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        Transform {
            translation: self.translation.interpolate_linear(&other.translation, f),
            rotation: self.rotation.interpolate_linear(&other.rotation, f),
            scale: self.scale.interpolate_linear(&other.scale, f),
        }
    }
}

/// Only properties changed in `other` are interpolated, the rest are kept from `self`.
impl InterpolateLinear for CameraPose {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        let mut result = self.clone();
        result.lerp_changed(other, f);
        result
    }
}

impl InterpolateLinear for CameraVariableTable {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        let mut result = self.clone();
        result.lerp(other, f);
        result
    }
}

impl InterpolateLinear for CameraNodeEvaluationResult {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        let mut result = self.clone();
        result.lerp(other, f);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn transform_interpolation() {
        let a = Transform::from_xyz(0., 0., 0.);
        let b = Transform::from_xyz(4., 0., -2.)
            .with_rotation(Quat::from_rotation_y(FRAC_PI_2))
            .with_scale(Vec3::splat(3.));

        let half = a.interpolate_linear(&b, 0.5);
        assert!(half.translation.abs_diff_eq(Vec3::new(2., 0., -1.), 1e-5));
        assert!(half.scale.abs_diff_eq(Vec3::splat(2.), 1e-5));
        assert!(
            half.rotation
                .abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2 / 2.), 1e-5)
        );
    }

    #[test]
    fn pose_interpolation_keeps_unchanged_properties() {
        let mut a = CameraPose::default();
        a.set_field_of_view(60.);

        let mut b = CameraPose::default();
        b.set_location(Vec3::Y * 2.);

        let half = a.interpolate_linear(&b, 0.5);
        assert_eq!(half.field_of_view(), 60.);
        assert!(half.location().abs_diff_eq(Vec3::Y, 1e-5));
    }
}
