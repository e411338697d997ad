use std::sync::Arc;

use bevy::math::Vec3;
use bevy_camera_rig_core::{
    camera_node::CameraNode,
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{
        CameraNodeEvaluator, CameraNodeEvaluatorInitializeParams, EvaluatorHandle,
        builder::CameraNodeEvaluatorBuilder, tree::CameraNodeEvaluatorTree,
    },
};
use serde::Deserialize;

/// Makes the camera location lag behind, closing half of the remaining distance every
/// `half_life` seconds. Snaps on camera cuts.
#[derive(Clone, Debug, Deserialize)]
pub struct DampenPositionCameraNode {
    pub half_life: f32,
}

impl Default for DampenPositionCameraNode {
    fn default() -> Self {
        Self { half_life: 0.2 }
    }
}

#[derive(Debug)]
pub struct DampenPositionCameraNodeEvaluator {
    half_life: f32,
    location: Option<Vec3>,
}

impl CameraNode for DampenPositionCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(DampenPositionCameraNodeEvaluator {
            half_life: self.half_life,
            location: None,
        })
    }

    fn display_name(&self) -> String {
        "〰 Dampen position".into()
    }
}

impl CameraNodeEvaluator for DampenPositionCameraNodeEvaluator {
    fn on_initialize(
        &mut self,
        _params: &CameraNodeEvaluatorInitializeParams,
        _result: &mut CameraNodeEvaluationResult,
    ) {
        self.location = None;
    }

    fn on_run(
        &mut self,
        params: &CameraNodeEvaluationParams,
        _tree: &CameraNodeEvaluatorTree,
        result: &mut CameraNodeEvaluationResult,
    ) {
        let desired = result.camera_pose.location();
        let location = match self.location {
            Some(current) if !result.is_camera_cut && self.half_life > 0. => {
                let factor = 1. - 0.5_f32.powf(params.delta_time / self.half_life);
                current.lerp(desired, factor)
            }
            _ => desired,
        };

        self.location = Some(location);
        result.camera_pose.set_location(location);
    }
}
