pub mod builder;
pub mod tree;

use std::{any::Any, fmt::Debug};

use bitflags::bitflags;

use crate::{
    blend::BlendCameraNodeEvaluator,
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
};
use builder::CameraNodeEvaluatorBuilder;
use tree::CameraNodeEvaluatorTree;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct CameraNodeEvaluatorFlags: u8 {
        /// The evaluator wants [`CameraNodeEvaluator::on_update_parameters`] to be called before
        /// the tree runs
        const NEEDS_PARAMETER_UPDATE = 1 << 0;
    }
}

/// Names one evaluator inside one [`CameraNodeEvaluatorStorage`].
///
/// Handles are invalidated when the storage is cleared, and resolve to nothing afterwards.
///
/// [`CameraNodeEvaluatorStorage`]: crate::storage::CameraNodeEvaluatorStorage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvaluatorHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

pub struct CameraNodeEvaluatorInitializeParams<'a> {
    /// Result of the camera rig that was active before this one, if any
    pub last_active_result: Option<&'a CameraNodeEvaluationResult>,
}

/// Runtime counterpart of a [`CameraNode`](crate::camera_node::CameraNode).
///
/// An evaluator holds the per-instance state of one node and is constructed in place inside an
/// evaluator storage. Children are referred to by handle and evaluated through the
/// [`CameraNodeEvaluatorTree`] passed to [`CameraNodeEvaluator::on_run`].
pub trait CameraNodeEvaluator: Any + Send + Sync + Debug {
    fn flags(&self) -> CameraNodeEvaluatorFlags {
        CameraNodeEvaluatorFlags::empty()
    }

    /// Child evaluators, in the order they were built. `None` for absent optional children.
    fn children(&self) -> Vec<Option<EvaluatorHandle>> {
        Vec::new()
    }

    /// Called right after construction, to build child evaluators.
    fn on_build(&mut self, _builder: &mut CameraNodeEvaluatorBuilder) {}

    fn on_initialize(
        &mut self,
        _params: &CameraNodeEvaluatorInitializeParams,
        _result: &mut CameraNodeEvaluationResult,
    ) {
    }

    fn on_update_parameters(
        &mut self,
        _params: &CameraNodeEvaluationParams,
        _result: &mut CameraNodeEvaluationResult,
    ) {
    }

    fn on_run(
        &mut self,
        params: &CameraNodeEvaluationParams,
        tree: &CameraNodeEvaluatorTree,
        result: &mut CameraNodeEvaluationResult,
    );

    fn on_teardown(&mut self) {}

    fn as_blend(&self) -> Option<&dyn BlendCameraNodeEvaluator> {
        None
    }

    fn as_blend_mut(&mut self) -> Option<&mut dyn BlendCameraNodeEvaluator> {
        None
    }

    fn display_name(&self) -> String {
        let name = std::any::type_name::<Self>();
        name.rsplit("::").next().unwrap_or(name).to_string()
    }
}

impl dyn CameraNodeEvaluator {
    pub fn downcast_ref<T: CameraNodeEvaluator>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }

    pub fn downcast_mut<T: CameraNodeEvaluator>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut()
    }
}
