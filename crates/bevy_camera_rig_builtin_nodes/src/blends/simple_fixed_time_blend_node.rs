use std::sync::Arc;

use bevy_camera_rig_core::{
    blend::{
        BlendCameraNodeEvaluator, CameraNodeBlendInterruptionParams, CameraNodeBlendParams,
        CameraNodeBlendResult, CameraNodePreBlendParams, CameraNodePreBlendResult,
        SimpleBlendState,
    },
    camera_node::CameraNode,
    curves::BlendCurve,
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{
        CameraNodeEvaluator, EvaluatorHandle, builder::CameraNodeEvaluatorBuilder,
        tree::CameraNodeEvaluatorTree,
    },
};
use serde::Deserialize;

/// Shortest blend time an interrupted transition can be scaled down to, as a fraction of the
/// original one.
const MIN_INTERRUPTED_BLEND_SCALE: f32 = 0.1;

/// Blends over `blend_time` seconds, following `curve`.
#[derive(Clone, Debug, Deserialize)]
pub struct SimpleFixedTimeBlendCameraNode {
    pub blend_time: f32,
    #[serde(default)]
    pub curve: BlendCurve,
}

impl Default for SimpleFixedTimeBlendCameraNode {
    fn default() -> Self {
        Self {
            blend_time: 0.5,
            curve: BlendCurve::default(),
        }
    }
}

impl SimpleFixedTimeBlendCameraNode {
    pub fn new(blend_time: f32, curve: BlendCurve) -> Self {
        Self { blend_time, curve }
    }
}

#[derive(Debug)]
pub struct SimpleFixedTimeBlendCameraNodeEvaluator {
    /// `None` once frozen
    node: Option<Arc<SimpleFixedTimeBlendCameraNode>>,
    blend_time: f32,
    curve: BlendCurve,
    state: SimpleBlendState,
}

impl CameraNode for SimpleFixedTimeBlendCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(SimpleFixedTimeBlendCameraNodeEvaluator {
            blend_time: self.blend_time,
            curve: self.curve,
            node: Some(self),
            state: SimpleBlendState::default(),
        })
    }

    fn display_name(&self) -> String {
        "⏱ Fixed time blend".into()
    }
}

impl CameraNodeEvaluator for SimpleFixedTimeBlendCameraNodeEvaluator {
    fn on_run(
        &mut self,
        params: &CameraNodeEvaluationParams,
        _tree: &CameraNodeEvaluatorTree,
        _result: &mut CameraNodeEvaluationResult,
    ) {
        let delta = if self.blend_time > 0. {
            params.delta_time / self.blend_time
        } else {
            1.
        };
        let curve = self.curve;
        self.state.advance(delta, |alpha| curve.evaluate(alpha));
    }

    fn as_blend(&self) -> Option<&dyn BlendCameraNodeEvaluator> {
        Some(self)
    }

    fn as_blend_mut(&mut self) -> Option<&mut dyn BlendCameraNodeEvaluator> {
        Some(self)
    }
}

impl BlendCameraNodeEvaluator for SimpleFixedTimeBlendCameraNodeEvaluator {
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

    /// The interrupted blend only got its camera rig part of the way in, so less of a transition
    /// is left to make: the blend time is scaled by how far the interrupted blend went.
    fn initialize_from_interruption(
        &mut self,
        params: &CameraNodeBlendInterruptionParams,
    ) -> bool {
        let Some(interrupted) = params.interrupted_blend else {
            return false;
        };

        let scale = interrupted
            .blend_factor()
            .clamp(MIN_INTERRUPTED_BLEND_SCALE, 1.);
        self.blend_time *= scale;
        true
    }

    fn set_reversed(&mut self, reversed: bool) -> bool {
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
