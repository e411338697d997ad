use bevy::{
    app::{App, Plugin, PostUpdate},
    ecs::{
        intern::Interned,
        schedule::{IntoScheduleConfigs, ScheduleLabel, SystemSet},
    },
    transform::TransformSystems,
};
use bevy_camera_rig_builtin_nodes::register_builtin_nodes;
use bevy_camera_rig_core::{plugin::CameraRigCorePlugin, type_registry::CameraObjectTypeRegistry};

use crate::systems::update_camera_rig_players;

/// Adds camera rig support to an app
pub struct CameraRigPlugin {
    /// Schedule camera rig players are updated in
    pub schedule: Interned<dyn ScheduleLabel>,
}

impl Default for CameraRigPlugin {
    fn default() -> Self {
        Self {
            schedule: PostUpdate.intern(),
        }
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum CameraRigSet {
    /// Evaluates camera rigs and writes the result to cameras, before transforms are propagated
    Update,
}

impl Plugin for CameraRigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(CameraRigCorePlugin);

        register_builtin_nodes(&mut CameraObjectTypeRegistry::write());

        app.configure_sets(
            self.schedule,
            CameraRigSet::Update.before(TransformSystems::Propagate),
        );
        app.add_systems(
            self.schedule,
            update_camera_rig_players.in_set(CameraRigSet::Update),
        );
    }
}
