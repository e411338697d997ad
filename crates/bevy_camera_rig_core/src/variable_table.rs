use bevy::{
    math::{Quat, Vec2, Vec3},
    reflect::Reflect,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{CameraRigError, CameraRigResult},
    interpolation::linear::InterpolateLinear,
};

/// Identifies a camera variable. Usually derived from the variable name with
/// [`CameraVariableId::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraVariableId(u32);

impl CameraVariableId {
    /// Location of the target the camera follows, in world space
    pub const TARGET_LOCATION: Self = Self::from_name("target_location");
    /// Rotation of the target the camera follows, in world space
    pub const TARGET_ROTATION: Self = Self::from_name("target_rotation");

    /// FNV-1a hash of the name.
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u32 = 0x811c_9dc5;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(0x0100_0193);
            i += 1;
        }
        Self(hash)
    }
}

#[derive(Reflect, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CameraVariableValue {
    Bool(bool),
    I32(i32),
    F32(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Quat(Quat),
}

macro_rules! variable_value_accessors {
    ($($variant:ident($ty:ty) => $getter:ident;)*) => {
        impl CameraVariableValue {
            $(
                pub fn $getter(&self) -> CameraRigResult<$ty> {
                    match self {
                        Self::$variant(value) => Ok(*value),
                        other => Err(CameraRigError::MismatchedVariableType(
                            stringify!($variant).into(),
                            other.type_name().into(),
                        )),
                    }
                }
            )*

            pub fn type_name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => stringify!($variant),)*
                }
            }
        }

        $(
            impl From<$ty> for CameraVariableValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

variable_value_accessors! {
    Bool(bool) => as_bool;
    I32(i32) => as_i32;
    F32(f32) => as_f32;
    Vec2(Vec2) => as_vec2;
    Vec3(Vec3) => as_vec3;
    Quat(Quat) => as_quat;
}

impl InterpolateLinear for CameraVariableValue {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        match (self, other) {
            (Self::F32(a), Self::F32(b)) => Self::F32(a.interpolate_linear(b, f)),
            (Self::I32(a), Self::I32(b)) => {
                Self::I32((*a as f32).interpolate_linear(&(*b as f32), f).round() as i32)
            }
            (Self::Vec2(a), Self::Vec2(b)) => Self::Vec2(a.interpolate_linear(b, f)),
            (Self::Vec3(a), Self::Vec3(b)) => Self::Vec3(a.interpolate_linear(b, f)),
            (Self::Quat(a), Self::Quat(b)) => Self::Quat(a.interpolate_linear(b, f)),
            // Booleans and mismatched types flip half-way
            _ if f < 0.5 => *self,
            _ => *other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct CameraVariableEntry {
    value: CameraVariableValue,
    changed: bool,
}

/// Typed variables shared by the evaluators of a camera rig, with per-variable changed flags.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CameraVariableTable {
    entries: IndexMap<CameraVariableId, CameraVariableEntry>,
}

impl CameraVariableTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: CameraVariableId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: CameraVariableId) -> Option<CameraVariableValue> {
        self.entries.get(&id).map(|entry| entry.value)
    }

    pub fn try_get(&self, id: CameraVariableId) -> CameraRigResult<CameraVariableValue> {
        self.get(id).ok_or(CameraRigError::MissingVariable(id))
    }

    pub fn get_bool(&self, id: CameraVariableId) -> CameraRigResult<bool> {
        self.try_get(id)?.as_bool()
    }

    pub fn get_i32(&self, id: CameraVariableId) -> CameraRigResult<i32> {
        self.try_get(id)?.as_i32()
    }

    pub fn get_f32(&self, id: CameraVariableId) -> CameraRigResult<f32> {
        self.try_get(id)?.as_f32()
    }

    pub fn get_vec2(&self, id: CameraVariableId) -> CameraRigResult<Vec2> {
        self.try_get(id)?.as_vec2()
    }

    pub fn get_vec3(&self, id: CameraVariableId) -> CameraRigResult<Vec3> {
        self.try_get(id)?.as_vec3()
    }

    pub fn get_quat(&self, id: CameraVariableId) -> CameraRigResult<Quat> {
        self.try_get(id)?.as_quat()
    }

    /// Sets a variable and flags it as changed.
    pub fn set(&mut self, id: CameraVariableId, value: CameraVariableValue) {
        self.entries.insert(
            id,
            CameraVariableEntry {
                value,
                changed: true,
            },
        );
    }

    pub fn remove(&mut self, id: CameraVariableId) -> Option<CameraVariableValue> {
        self.entries.shift_remove(&id).map(|entry| entry.value)
    }

    pub fn is_changed(&self, id: CameraVariableId) -> bool {
        self.entries.get(&id).is_some_and(|entry| entry.changed)
    }

    pub fn clear_changed_flags(&mut self) {
        self.entries
            .values_mut()
            .for_each(|entry| entry.changed = false);
    }

    pub fn iter(&self) -> impl Iterator<Item = (CameraVariableId, CameraVariableValue)> + '_ {
        self.entries.iter().map(|(id, entry)| (*id, entry.value))
    }

    /// Copies every variable flagged as changed in `other`.
    pub fn override_changed(&mut self, other: &CameraVariableTable) {
        for (id, entry) in other.entries.iter().filter(|(_, entry)| entry.changed) {
            self.set(*id, entry.value);
        }
    }

    /// Copies every variable of `other`.
    pub fn override_all(&mut self, other: &CameraVariableTable) {
        for (id, entry) in other.entries.iter() {
            self.set(*id, entry.value);
        }
    }

    /// Interpolates towards every variable of `other`.
    ///
    /// Variables only present in `other` are taken as they are.
    pub fn lerp(&mut self, other: &CameraVariableTable, factor: f32) {
        for (id, entry) in other.entries.iter() {
            let value = match self.get(*id) {
                Some(value) => value.interpolate_linear(&entry.value, factor),
                None => entry.value,
            };
            self.set(*id, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEED: CameraVariableId = CameraVariableId::from_name("speed");
    const ARMED: CameraVariableId = CameraVariableId::from_name("armed");

    #[test]
    fn ids_are_stable_and_distinct() {
        assert_eq!(CameraVariableId::from_name("speed"), SPEED);
        assert_ne!(SPEED, ARMED);
        assert_ne!(
            CameraVariableId::TARGET_LOCATION,
            CameraVariableId::TARGET_ROTATION
        );
        // Reference FNV-1a value for the empty string
        assert_eq!(CameraVariableId::from_name(""), CameraVariableId(0x811c_9dc5));
    }

    #[test]
    fn typed_access() {
        let mut table = CameraVariableTable::default();
        table.set(SPEED, 2.5_f32.into());

        assert_eq!(table.get_f32(SPEED), Ok(2.5));
        assert_eq!(
            table.get_bool(SPEED),
            Err(CameraRigError::MismatchedVariableType(
                "Bool".into(),
                "F32".into()
            ))
        );
        assert_eq!(
            table.get_f32(ARMED),
            Err(CameraRigError::MissingVariable(ARMED))
        );
    }

    #[test]
    fn changed_flags() {
        let mut table = CameraVariableTable::default();
        table.set(SPEED, 1.0_f32.into());
        table.set(ARMED, true.into());
        table.clear_changed_flags();
        assert!(!table.is_changed(SPEED));

        table.set(SPEED, 3.0_f32.into());
        let mut other = CameraVariableTable::default();
        other.override_changed(&table);
        assert_eq!(other.len(), 1);
        assert_eq!(other.get_f32(SPEED), Ok(3.0));
    }

    #[test]
    fn lerp_blends_numbers_and_flips_booleans() {
        let mut from = CameraVariableTable::default();
        from.set(SPEED, 0.0_f32.into());
        from.set(ARMED, false.into());

        let mut to = CameraVariableTable::default();
        to.set(SPEED, 10.0_f32.into());
        to.set(ARMED, true.into());
        to.set(CameraVariableId::TARGET_LOCATION, Vec3::X.into());

        let mut early = from.clone();
        early.lerp(&to, 0.25);
        assert_eq!(early.get_f32(SPEED), Ok(2.5));
        assert_eq!(early.get_bool(ARMED), Ok(false));
        assert_eq!(early.get_vec3(CameraVariableId::TARGET_LOCATION), Ok(Vec3::X));

        from.lerp(&to, 0.75);
        assert_eq!(from.get_f32(SPEED), Ok(7.5));
        assert_eq!(from.get_bool(ARMED), Ok(true));
    }
}
