//! # Bevy Camera Rig
//!
//! **Bevy Camera Rig** drives gameplay cameras from data-driven camera rigs.
//!
//! A camera rig is a tree of camera nodes, defined in `*.camrig.ron` files:
//! ```ron
//! (
//!     name: "third_person",
//!     root: (ty: "ArrayCameraNode", inner: (children: [
//!         (ty: "AttachToTargetCameraNode", inner: ()),
//!         (ty: "OffsetCameraNode", inner: (offset: (0.5, 1.5, 4.0))),
//!         (ty: "DampenPositionCameraNode", inner: (half_life: 0.1)),
//!     ])),
//!     enter_blend: Some((ty: "SimpleFixedTimeBlendCameraNode", inner: (blend_time: 0.8))),
//! )
//! ```
//!
//! Add a [`CameraRigPlayer`] next to a camera, and tell it which rig to run:
//! ```ignore
//!     commands.spawn((
//!         Camera3d::default(),
//!         CameraRigPlayer::new()
//!             .with_target(player_entity)
//!             .with_rig(asset_server.load("cameras/third_person.camrig.ron")),
//!     ));
//! ```
//! Transitioning to another rig blends from the current one. Transitioning back before a blend
//! finishes plays the blend backwards instead.
//!
//! Custom nodes implement [`CameraNode`] and [`CameraNodeEvaluator`], and are made loadable with
//! [`CameraObjectTypeRegistry::register_camera_node`].
//!
//! [`CameraRigPlayer`]: player::CameraRigPlayer
//! [`CameraNode`]: bevy_camera_rig_core::camera_node::CameraNode
//! [`CameraNodeEvaluator`]: bevy_camera_rig_core::evaluator::CameraNodeEvaluator
//! [`CameraObjectTypeRegistry::register_camera_node`]: bevy_camera_rig_core::type_registry::CameraObjectTypeRegistry::register_camera_node

pub mod player;
pub mod plugin;
pub mod systems;

pub use bevy_camera_rig_builtin_nodes as builtin_nodes;
pub use bevy_camera_rig_core as core;

pub mod prelude {
    pub use super::player::CameraRigPlayer;
    pub use super::plugin::{CameraRigPlugin, CameraRigSet};
    pub use bevy_camera_rig_builtin_nodes::prelude::*;
    pub use bevy_camera_rig_core::prelude::*;
}
