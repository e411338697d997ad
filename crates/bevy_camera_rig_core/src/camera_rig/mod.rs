pub mod loader;
pub mod parameters;

use bevy::{asset::Asset, reflect::TypePath};

use crate::{camera_node::CameraNodeRef, storage::CameraNodeEvaluatorAllocationInfo};
use parameters::CameraRigParameters;

/// A named tree of camera nodes, ready to be pushed onto a blend stack.
#[derive(Asset, TypePath, Debug, Clone)]
pub struct CameraRigAsset {
    pub name: String,
    pub root_node: CameraNodeRef,
    /// Blend used when transitioning to this rig, unless the transition provides its own
    pub enter_blend: Option<CameraNodeRef>,
    /// Variables the rig reads, with their default values
    pub parameters: CameraRigParameters,
    /// Memory needed to build the rig's evaluators into a single page
    pub allocation_info: CameraNodeEvaluatorAllocationInfo,
}

impl CameraRigAsset {
    pub fn new(name: impl Into<String>, root_node: CameraNodeRef) -> Self {
        let allocation_info = CameraNodeEvaluatorAllocationInfo::compute(Some(&root_node));
        Self {
            name: name.into(),
            root_node,
            enter_blend: None,
            parameters: CameraRigParameters::default(),
            allocation_info,
        }
    }

    pub fn with_enter_blend(mut self, blend: CameraNodeRef) -> Self {
        self.enter_blend = Some(blend);
        self
    }

    pub fn with_parameters(mut self, parameters: CameraRigParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Number of camera nodes in the rig.
    pub fn node_count(&self) -> usize {
        self.root_node.node_count()
    }
}
