use bevy::{ecs::resource::Resource, reflect::Reflect};
use serde::{Deserialize, Serialize};

use crate::blend_stack::DEFAULT_MAX_BLEND_STACK_ENTRIES;

/// App-wide defaults for camera rig players.
#[derive(Resource, Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraRigSettings {
    /// Seconds taken by transitions that don't specify a blend
    pub default_blend_time: f32,
    pub max_blend_stack_entries: usize,
    /// Vertical field of view in degrees, used when a rig doesn't set one
    pub default_field_of_view: f32,
}

impl Default for CameraRigSettings {
    fn default() -> Self {
        Self {
            default_blend_time: 0.5,
            max_blend_stack_entries: DEFAULT_MAX_BLEND_STACK_ENTRIES,
            default_field_of_view: 90.,
        }
    }
}

impl CameraRigSettings {
    pub fn from_ron(source: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings = CameraRigSettings::from_ron("(default_blend_time: 1.25)").unwrap();
        assert_eq!(settings.default_blend_time, 1.25);
        assert_eq!(
            settings.max_blend_stack_entries,
            DEFAULT_MAX_BLEND_STACK_ENTRIES
        );
        assert_eq!(settings.default_field_of_view, 90.);

        assert!(CameraRigSettings::from_ron("(default_blend_time: \"slow\")").is_err());
    }
}
