use bevy::{log::warn, platform::collections::HashSet};

use crate::{
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{
        CameraNodeEvaluator, CameraNodeEvaluatorFlags, CameraNodeEvaluatorInitializeParams,
        EvaluatorHandle,
    },
    storage::CameraNodeEvaluatorStorage,
};

/// View over the evaluators of a storage, used to walk and run them.
///
/// Every call borrows the evaluators it touches for its own duration only. An evaluator that is
/// already borrowed (e.g. because a malformed tree lists an ancestor as a child) is skipped with a
/// warning.
#[derive(Clone, Copy)]
pub struct CameraNodeEvaluatorTree<'s> {
    storage: &'s CameraNodeEvaluatorStorage,
}

impl<'s> CameraNodeEvaluatorTree<'s> {
    pub fn new(storage: &'s CameraNodeEvaluatorStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &'s CameraNodeEvaluatorStorage {
        self.storage
    }

    /// Runs a single evaluator. Composite evaluators are expected to run their own children.
    pub fn run(
        &self,
        handle: Option<EvaluatorHandle>,
        params: &CameraNodeEvaluationParams,
        result: &mut CameraNodeEvaluationResult,
    ) {
        let Some(handle) = handle else {
            return;
        };
        self.with_evaluator_mut(handle, |evaluator| {
            evaluator.on_run(params, self, result);
        });
    }

    /// Initializes every evaluator of the tree, parents before children.
    pub fn initialize(
        &self,
        root: Option<EvaluatorHandle>,
        params: &CameraNodeEvaluatorInitializeParams,
        result: &mut CameraNodeEvaluationResult,
    ) {
        for handle in self.depth_first(root) {
            self.with_evaluator_mut(handle, |evaluator| evaluator.on_initialize(params, result));
        }
    }

    /// Gives evaluators flagged with [`CameraNodeEvaluatorFlags::NEEDS_PARAMETER_UPDATE`] a
    /// chance to update before the tree runs.
    pub fn update_parameters(
        &self,
        root: Option<EvaluatorHandle>,
        params: &CameraNodeEvaluationParams,
        result: &mut CameraNodeEvaluationResult,
    ) {
        for handle in self.depth_first(root) {
            self.with_evaluator_mut(handle, |evaluator| {
                if evaluator
                    .flags()
                    .contains(CameraNodeEvaluatorFlags::NEEDS_PARAMETER_UPDATE)
                {
                    evaluator.on_update_parameters(params, result);
                }
            });
        }
    }

    pub fn teardown(&self, root: Option<EvaluatorHandle>) {
        for handle in self.depth_first(root) {
            self.with_evaluator_mut(handle, |evaluator| evaluator.on_teardown());
        }
    }

    /// Visits every evaluator reachable from `root` in construction order.
    pub fn visit_depth_first(
        &self,
        root: Option<EvaluatorHandle>,
        mut visitor: impl FnMut(EvaluatorHandle, &(dyn CameraNodeEvaluator + 'static)),
    ) {
        for handle in self.depth_first(root) {
            match self.storage.try_borrow(handle) {
                Ok(evaluator) => visitor(handle, &*evaluator),
                Err(err) => warn!("Skipping camera evaluator while visiting tree: {err}"),
            }
        }
    }

    /// Handles of every evaluator reachable from `root`, in construction order.
    pub fn depth_first(&self, root: Option<EvaluatorHandle>) -> Vec<EvaluatorHandle> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<EvaluatorHandle> = root.into_iter().collect();
        while let Some(handle) = stack.pop() {
            let Ok(evaluator) = self.storage.try_borrow(handle) else {
                continue;
            };
            if !visited.insert(handle) {
                warn!("Camera evaluator {handle:?} is reachable more than once");
                continue;
            }
            order.push(handle);
            stack.extend(evaluator.children().into_iter().rev().flatten());
        }
        order
    }

    pub fn with_evaluator_mut<R>(
        &self,
        handle: EvaluatorHandle,
        f: impl FnOnce(&mut (dyn CameraNodeEvaluator + 'static)) -> R,
    ) -> Option<R> {
        match self.storage.try_borrow_mut(handle) {
            Ok(mut evaluator) => Some(f(&mut *evaluator)),
            Err(err) => {
                warn!("Skipping camera evaluator: {err}");
                None
            }
        }
    }
}
