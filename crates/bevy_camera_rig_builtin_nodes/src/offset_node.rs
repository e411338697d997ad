use std::sync::Arc;

use bevy::{math::Vec3, reflect::Reflect};
use bevy_camera_rig_core::{
    camera_node::CameraNode,
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{
        CameraNodeEvaluator, EvaluatorHandle, builder::CameraNodeEvaluatorBuilder,
        tree::CameraNodeEvaluatorTree,
    },
    variable_table::CameraVariableId,
};
use serde::{Deserialize, Serialize};

#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffsetSpace {
    /// Relative to the camera rotation
    #[default]
    Local,
    World,
}

/// Moves the camera by a fixed offset, or by the `Vec3` variable named `offset_variable` when it
/// is set.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OffsetCameraNode {
    pub offset: Vec3,
    #[serde(default)]
    pub space: OffsetSpace,
    #[serde(default)]
    pub offset_variable: Option<String>,
}

impl OffsetCameraNode {
    pub fn local(offset: Vec3) -> Self {
        Self {
            offset,
            space: OffsetSpace::Local,
            offset_variable: None,
        }
    }

    pub fn world(offset: Vec3) -> Self {
        Self {
            offset,
            space: OffsetSpace::World,
            offset_variable: None,
        }
    }
}

#[derive(Debug)]
pub struct OffsetCameraNodeEvaluator {
    offset: Vec3,
    space: OffsetSpace,
    offset_variable: Option<CameraVariableId>,
}

impl CameraNode for OffsetCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(OffsetCameraNodeEvaluator {
            offset: self.offset,
            space: self.space,
            offset_variable: self.offset_variable.as_deref().map(CameraVariableId::from_name),
        })
    }

    fn display_name(&self) -> String {
        "↔ Offset".into()
    }
}

impl CameraNodeEvaluator for OffsetCameraNodeEvaluator {
    fn on_run(
        &mut self,
        _params: &CameraNodeEvaluationParams,
        _tree: &CameraNodeEvaluatorTree,
        result: &mut CameraNodeEvaluationResult,
    ) {
        let offset = self
            .offset_variable
            .and_then(|id| result.variable_table.get_vec3(id).ok())
            .unwrap_or(self.offset);

        let pose = &mut result.camera_pose;
        let offset = match self.space {
            OffsetSpace::Local => pose.rotation() * offset,
            OffsetSpace::World => offset,
        };
        pose.set_location(pose.location() + offset);
    }
}
