//! Blend evaluators mix the result of a camera rig into the result of the rigs below it.
//!
//! A blend goes through a small state machine: it runs each frame to advance, blends parameters
//! and results while active, can be interrupted by a newer blend and resumed from it, can be
//! reversed mid-flight, and can be frozen once the data it came from is gone.

mod simple;

pub use simple::SimpleBlendState;

use crate::{
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::CameraNodeEvaluator,
    pose::CameraPose,
    variable_table::CameraVariableTable,
};

pub struct CameraNodePreBlendParams<'a> {
    pub evaluation_params: &'a CameraNodeEvaluationParams,
    /// Pose blended so far, from the rigs below
    pub last_camera_pose: &'a CameraPose,
    /// Variables of the rig being blended in
    pub child_variable_table: &'a CameraVariableTable,
}

pub struct CameraNodePreBlendResult<'a> {
    /// Variables blended so far, to blend the child variables into
    pub variable_table: &'a mut CameraVariableTable,
    pub is_blend_full: bool,
    pub is_blend_finished: bool,
}

impl<'a> CameraNodePreBlendResult<'a> {
    pub fn new(variable_table: &'a mut CameraVariableTable) -> Self {
        Self {
            variable_table,
            is_blend_full: false,
            is_blend_finished: false,
        }
    }
}

pub struct CameraNodeBlendParams<'a> {
    pub evaluation_params: &'a CameraNodeEvaluationParams,
    /// Result of the rig being blended in
    pub child_result: &'a CameraNodeEvaluationResult,
}

pub struct CameraNodeBlendResult<'a> {
    /// Result blended so far, to blend the child result into
    pub blended_result: &'a mut CameraNodeEvaluationResult,
    /// The child result fully replaces what was below it
    pub is_blend_full: bool,
    /// The blend reached its end, in whichever direction it runs
    pub is_blend_finished: bool,
}

impl<'a> CameraNodeBlendResult<'a> {
    pub fn new(blended_result: &'a mut CameraNodeEvaluationResult) -> Self {
        Self {
            blended_result,
            is_blend_full: false,
            is_blend_finished: false,
        }
    }
}

pub struct CameraNodeBlendInterruptionParams<'a> {
    /// Blend that was still running when the new one started
    pub interrupted_blend: Option<&'a dyn BlendCameraNodeEvaluator>,
    /// Last result of the interrupted camera rig
    pub interrupted_result: &'a CameraNodeEvaluationResult,
}

pub trait BlendCameraNodeEvaluator: CameraNodeEvaluator {
    /// Blends the child's variables into the variables accumulated so far.
    fn blend_parameters(
        &mut self,
        params: &CameraNodePreBlendParams,
        result: &mut CameraNodePreBlendResult,
    );

    /// Blends the child's result into the result accumulated so far.
    fn blend_results(&mut self, params: &CameraNodeBlendParams, result: &mut CameraNodeBlendResult);

    /// Takes over from a blend that was interrupted before finishing. Returns `false` if this
    /// blend can't, in which case it simply starts from the beginning.
    fn initialize_from_interruption(
        &mut self,
        _params: &CameraNodeBlendInterruptionParams,
    ) -> bool {
        false
    }

    /// Makes the blend run backwards (or forwards again). Returns `false` if it can't, in which
    /// case the caller has to start a new blend instead.
    fn set_reversed(&mut self, _reversed: bool) -> bool {
        false
    }

    fn is_reversed(&self) -> bool {
        false
    }

    /// Current weight of the child result, between 0 and 1.
    fn blend_factor(&self) -> f32;

    /// Detaches the blend from its camera node. The node isn't accessed afterwards, but the blend
    /// keeps running from the state it had.
    fn freeze(&mut self);

    fn is_frozen(&self) -> bool;
}
