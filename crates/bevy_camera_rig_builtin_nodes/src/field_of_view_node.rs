use std::sync::Arc;

use bevy_camera_rig_core::{
    camera_node::CameraNode,
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{
        CameraNodeEvaluator, EvaluatorHandle, builder::CameraNodeEvaluatorBuilder,
        tree::CameraNodeEvaluatorTree,
    },
};
use serde::Deserialize;

/// Sets the vertical field of view, in degrees.
///
/// Clears any focal length set by nodes that ran earlier, so that the field of view isn't
/// derived from a lens anymore.
#[derive(Clone, Debug, Deserialize)]
pub struct FieldOfViewCameraNode {
    pub field_of_view: f32,
}

impl Default for FieldOfViewCameraNode {
    fn default() -> Self {
        Self { field_of_view: 90. }
    }
}

impl FieldOfViewCameraNode {
    pub fn new(field_of_view: f32) -> Self {
        Self { field_of_view }
    }
}

#[derive(Debug)]
pub struct FieldOfViewCameraNodeEvaluator {
    field_of_view: f32,
}

impl CameraNode for FieldOfViewCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(FieldOfViewCameraNodeEvaluator {
            field_of_view: self.field_of_view,
        })
    }

    fn display_name(&self) -> String {
        "🔭 Field of view".into()
    }
}

impl CameraNodeEvaluator for FieldOfViewCameraNodeEvaluator {
    fn on_run(
        &mut self,
        _params: &CameraNodeEvaluationParams,
        _tree: &CameraNodeEvaluatorTree,
        result: &mut CameraNodeEvaluationResult,
    ) {
        let pose = &mut result.camera_pose;
        pose.set_field_of_view(self.field_of_view);
        if pose.focal_length() > 0. {
            pose.set_focal_length(-1.);
        }
    }
}
