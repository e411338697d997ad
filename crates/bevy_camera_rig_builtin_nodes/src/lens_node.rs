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

/// Physical lens settings. The field of view follows from the focal length and sensor width.
#[derive(Clone, Debug, Deserialize)]
pub struct LensCameraNode {
    /// Focal length in millimeters
    pub focal_length: f32,
    #[serde(default)]
    pub aperture: Option<f32>,
    #[serde(default)]
    pub focus_distance: Option<f32>,
    /// Sensor size in millimeters
    #[serde(default)]
    pub sensor_size: Option<(f32, f32)>,
}

impl Default for LensCameraNode {
    fn default() -> Self {
        Self {
            focal_length: 35.,
            aperture: None,
            focus_distance: None,
            sensor_size: None,
        }
    }
}

#[derive(Debug)]
pub struct LensCameraNodeEvaluator {
    node: Arc<LensCameraNode>,
}

impl CameraNode for LensCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(LensCameraNodeEvaluator { node: self })
    }

    fn display_name(&self) -> String {
        "📷 Lens".into()
    }
}

impl CameraNodeEvaluator for LensCameraNodeEvaluator {
    fn on_run(
        &mut self,
        _params: &CameraNodeEvaluationParams,
        _tree: &CameraNodeEvaluatorTree,
        result: &mut CameraNodeEvaluationResult,
    ) {
        let node = &self.node;
        let pose = &mut result.camera_pose;

        pose.set_focal_length(node.focal_length);
        if let Some(aperture) = node.aperture {
            pose.set_aperture(aperture);
        }
        if let Some(focus_distance) = node.focus_distance {
            pose.set_focus_distance(focus_distance);
        }
        if let Some((width, height)) = node.sensor_size {
            pose.set_sensor_width(width);
            pose.set_sensor_height(height);
        }
    }
}
