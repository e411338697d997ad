use std::sync::Arc;

use bevy_camera_rig_core::{
    blend::{
        BlendCameraNodeEvaluator, CameraNodeBlendParams, CameraNodeBlendResult,
        CameraNodePreBlendParams, CameraNodePreBlendResult,
    },
    camera_node::CameraNode,
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{
        CameraNodeEvaluator, EvaluatorHandle, builder::CameraNodeEvaluatorBuilder,
        tree::CameraNodeEvaluatorTree,
    },
};
use serde::Deserialize;

/// Switches to the new camera rig at once.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PopBlendCameraNode;

#[derive(Debug)]
pub struct PopBlendCameraNodeEvaluator {
    is_frozen: bool,
}

impl CameraNode for PopBlendCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(PopBlendCameraNodeEvaluator { is_frozen: false })
    }

    fn display_name(&self) -> String {
        "⏏ Pop".into()
    }
}

impl CameraNodeEvaluator for PopBlendCameraNodeEvaluator {
    fn on_run(
        &mut self,
        _params: &CameraNodeEvaluationParams,
        _tree: &CameraNodeEvaluatorTree,
        _result: &mut CameraNodeEvaluationResult,
    ) {
    }

    fn as_blend(&self) -> Option<&dyn BlendCameraNodeEvaluator> {
        Some(self)
    }

    fn as_blend_mut(&mut self) -> Option<&mut dyn BlendCameraNodeEvaluator> {
        Some(self)
    }
}

impl BlendCameraNodeEvaluator for PopBlendCameraNodeEvaluator {
    fn blend_parameters(
        &mut self,
        params: &CameraNodePreBlendParams,
        result: &mut CameraNodePreBlendResult,
    ) {
        result
            .variable_table
            .override_all(params.child_variable_table);
        result.is_blend_full = true;
        result.is_blend_finished = true;
    }

    fn blend_results(&mut self, params: &CameraNodeBlendParams, result: &mut CameraNodeBlendResult) {
        result.blended_result.override_all(params.child_result);
        result.is_blend_full = true;
        result.is_blend_finished = true;
    }

    fn blend_factor(&self) -> f32 {
        1.
    }

    fn freeze(&mut self) {
        self.is_frozen = true;
    }

    fn is_frozen(&self) -> bool {
        self.is_frozen
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::Vec3;

    use super::*;
    use crate::testing::NodeHarness;

    #[test]
    fn pops_in_fully_and_never_reverses() {
        let mut harness = NodeHarness::build(PopBlendCameraNode);

        let mut child = CameraNodeEvaluationResult::default();
        child.camera_pose.set_location(Vec3::X);
        child.is_camera_cut = true;
        let mut blended = CameraNodeEvaluationResult::default();

        let blend = harness.blend();
        let evaluation_params = CameraNodeEvaluationParams::new(0.1);
        let mut result = CameraNodeBlendResult::new(&mut blended);
        blend.blend_results(
            &CameraNodeBlendParams {
                evaluation_params: &evaluation_params,
                child_result: &child,
            },
            &mut result,
        );
        assert!(result.is_blend_full && result.is_blend_finished);
        assert!(!blend.set_reversed(true));

        assert_eq!(blended.camera_pose.location(), Vec3::X);
        assert!(blended.is_camera_cut);
    }
}
