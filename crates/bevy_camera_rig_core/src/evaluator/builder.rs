use std::sync::Arc;

use crate::{
    camera_node::CameraNodeRef, evaluator::CameraNodeEvaluator, evaluator::EvaluatorHandle,
    storage::CameraNodeEvaluatorStorage, type_registry::CameraObjectTypeRegistry,
};

/// Turns camera nodes into evaluators living in a storage.
///
/// Evaluators are built parent first: a node constructs its evaluator with
/// [`CameraNodeEvaluatorBuilder::construct`], after which the evaluator gets to build its children
/// in [`CameraNodeEvaluator::on_build`].
pub struct CameraNodeEvaluatorBuilder<'s> {
    storage: &'s mut CameraNodeEvaluatorStorage,
}

impl<'s> CameraNodeEvaluatorBuilder<'s> {
    pub fn new(storage: &'s mut CameraNodeEvaluatorStorage) -> Self {
        Self { storage }
    }

    /// Builds the evaluator for `node` and all its descendants.
    pub fn build_evaluator(&mut self, node: Option<&CameraNodeRef>) -> Option<EvaluatorHandle> {
        let node = node?;
        let handle = Arc::clone(&node.0).build_evaluator(self);

        let Some(evaluator) = self.storage.raw_evaluator(handle) else {
            return Some(handle);
        };
        // SAFETY: the evaluator lives in a page that is never moved or freed while building, and
        // nothing else can reach it until the builder is done with the storage.
        unsafe { (*evaluator.as_ptr()).on_build(self) };

        Some(handle)
    }

    /// Moves `evaluator` into the storage.
    pub fn construct<T: CameraNodeEvaluator>(&mut self, evaluator: T) -> EvaluatorHandle {
        let type_id = CameraObjectTypeRegistry::register_evaluator::<T>();
        self.storage.construct(type_id, evaluator)
    }
}
