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

/// Sets the near and/or far clipping planes. Planes left unset are not touched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ClippingPlanesCameraNode {
    #[serde(default)]
    pub near: Option<f32>,
    #[serde(default)]
    pub far: Option<f32>,
}

#[derive(Debug)]
pub struct ClippingPlanesCameraNodeEvaluator {
    near: Option<f32>,
    far: Option<f32>,
}

impl CameraNode for ClippingPlanesCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(ClippingPlanesCameraNodeEvaluator {
            near: self.near,
            far: self.far,
        })
    }

    fn display_name(&self) -> String {
        "✂ Clipping planes".into()
    }
}

impl CameraNodeEvaluator for ClippingPlanesCameraNodeEvaluator {
    fn on_run(
        &mut self,
        _params: &CameraNodeEvaluationParams,
        _tree: &CameraNodeEvaluatorTree,
        result: &mut CameraNodeEvaluationResult,
    ) {
        if let Some(near) = self.near {
            result.camera_pose.set_near_clipping_plane(near);
        }
        if let Some(far) = self.far {
            result.camera_pose.set_far_clipping_plane(far);
        }
    }
}
