use std::sync::Arc;

use bevy_camera_rig_core::{
    blend::{
        BlendCameraNodeEvaluator, CameraNodeBlendParams, CameraNodeBlendResult,
        CameraNodePreBlendParams, CameraNodePreBlendResult, SimpleBlendState,
    },
    camera_node::CameraNode,
    curves::KeyframeCurve,
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{
        CameraNodeEvaluator, EvaluatorHandle, builder::CameraNodeEvaluatorBuilder,
        tree::CameraNodeEvaluatorTree,
    },
};
use serde::Deserialize;

/// Blends along an authored curve. The blend lasts as long as the curve's last key.
///
/// Authored curves are not symmetric in general, so the blend can only be reversed while it
/// hasn't reached the middle of the curve.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CurveBlendCameraNode {
    pub curve: KeyframeCurve,
}

#[derive(Debug)]
pub struct CurveBlendCameraNodeEvaluator {
    /// `None` once frozen
    node: Option<Arc<CurveBlendCameraNode>>,
    curve: KeyframeCurve,
    state: SimpleBlendState,
}

impl CameraNode for CurveBlendCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(CurveBlendCameraNodeEvaluator {
            curve: self.curve.clone(),
            node: Some(self),
            state: SimpleBlendState::default(),
        })
    }

    fn display_name(&self) -> String {
        "📈 Curve blend".into()
    }
}

impl CameraNodeEvaluator for CurveBlendCameraNodeEvaluator {
    fn on_run(
        &mut self,
        params: &CameraNodeEvaluationParams,
        _tree: &CameraNodeEvaluatorTree,
        _result: &mut CameraNodeEvaluationResult,
    ) {
        let duration = self.curve.duration();
        let delta = if duration > 0. {
            params.delta_time / duration
        } else {
            1.
        };
        let curve = &self.curve;
        self.state
            .advance(delta, |alpha| curve.evaluate(alpha * duration));
    }

    fn as_blend(&self) -> Option<&dyn BlendCameraNodeEvaluator> {
        Some(self)
    }

    fn as_blend_mut(&mut self) -> Option<&mut dyn BlendCameraNodeEvaluator> {
        Some(self)
    }
}

impl BlendCameraNodeEvaluator for CurveBlendCameraNodeEvaluator {
    fn blend_parameters(
        &mut self,
        params: &CameraNodePreBlendParams,
        result: &mut CameraNodePreBlendResult,
    ) {
        self.state.blend_parameters(params, result);
    }

    fn blend_results(&mut self, params: &CameraNodeBlendParams, result: &mut CameraNodeBlendResult) {
        self.state.blend_results(params, result);
    }

    fn set_reversed(&mut self, reversed: bool) -> bool {
        if reversed && self.state.alpha() > 0.5 {
            return false;
        }
        self.state.set_reversed(reversed);
        true
    }

    fn is_reversed(&self) -> bool {
        self.state.is_reversed()
    }

    fn blend_factor(&self) -> f32 {
        self.state.blend_factor()
    }

    fn freeze(&mut self) {
        self.node = None;
    }

    fn is_frozen(&self) -> bool {
        self.node.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NodeHarness;

    fn overshooting_blend() -> NodeHarness {
        let node: CurveBlendCameraNode = ron::from_str(
            "(curve: [(time: 0.0, value: 0.0), (time: 1.0, value: 1.0), (time: 2.0, value: 1.0)])",
        )
        .unwrap();
        NodeHarness::build(node)
    }

    #[test]
    fn follows_the_curve_over_its_duration() {
        let mut harness = overshooting_blend();
        let mut result = CameraNodeEvaluationResult::default();

        harness.run(0.5, &mut result);
        assert_eq!(harness.blend().blend_factor(), 0.5);
        harness.run(0.5, &mut result);
        assert_eq!(harness.blend().blend_factor(), 1.);

        harness.run(1., &mut result);
        assert_eq!(harness.blend().blend_factor(), 1.);
    }

    #[test]
    fn reverses_only_before_the_midpoint() {
        let mut harness = overshooting_blend();
        let mut result = CameraNodeEvaluationResult::default();

        harness.run(0.5, &mut result);
        assert!(harness.blend().set_reversed(true));
        assert!(harness.blend().set_reversed(false));

        harness.run(1., &mut result);
        assert!(!harness.blend().set_reversed(true));
        assert!(!harness.blend().is_reversed());
    }
}
