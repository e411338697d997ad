use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicU32, Ordering},
};

use crate::evaluator::CameraNodeEvaluator;

const EXCLUSIVE: u32 = u32::MAX;

/// Runtime borrow state of one evaluator: `0` when free, [`EXCLUSIVE`] when mutably borrowed,
/// the number of shared borrows otherwise.
#[derive(Default)]
pub(super) struct BorrowFlag(AtomicU32);

impl BorrowFlag {
    pub fn try_acquire_shared(&self) -> bool {
        self.0
            .fetch_update(Ordering::Acquire, Ordering::Relaxed, |count| {
                (count < EXCLUSIVE - 1).then_some(count + 1)
            })
            .is_ok()
    }

    pub fn try_acquire_exclusive(&self) -> bool {
        self.0
            .compare_exchange(0, EXCLUSIVE, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn release_shared(&self) {
        self.0.fetch_sub(1, Ordering::Release);
    }

    fn release_exclusive(&self) {
        self.0.store(0, Ordering::Release);
    }
}

/// Shared access to an evaluator living in a storage.
pub struct EvaluatorRef<'s> {
    evaluator: &'s (dyn CameraNodeEvaluator + 'static),
    flag: &'s BorrowFlag,
}

impl<'s> EvaluatorRef<'s> {
    pub(super) fn new(
        evaluator: &'s (dyn CameraNodeEvaluator + 'static),
        flag: &'s BorrowFlag,
    ) -> Self {
        Self { evaluator, flag }
    }
}

impl Deref for EvaluatorRef<'_> {
    type Target = dyn CameraNodeEvaluator;

    fn deref(&self) -> &Self::Target {
        self.evaluator
    }
}

impl Drop for EvaluatorRef<'_> {
    fn drop(&mut self) {
        self.flag.release_shared();
    }
}

impl fmt::Debug for EvaluatorRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.evaluator.fmt(f)
    }
}

/// Exclusive access to an evaluator living in a storage.
pub struct EvaluatorRefMut<'s> {
    evaluator: &'s mut (dyn CameraNodeEvaluator + 'static),
    flag: &'s BorrowFlag,
}

impl<'s> EvaluatorRefMut<'s> {
    pub(super) fn new(
        evaluator: &'s mut (dyn CameraNodeEvaluator + 'static),
        flag: &'s BorrowFlag,
    ) -> Self {
        Self { evaluator, flag }
    }
}

impl Deref for EvaluatorRefMut<'_> {
    type Target = dyn CameraNodeEvaluator;

    fn deref(&self) -> &Self::Target {
        self.evaluator
    }
}

impl DerefMut for EvaluatorRefMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.evaluator
    }
}

impl Drop for EvaluatorRefMut<'_> {
    fn drop(&mut self) {
        self.flag.release_exclusive();
    }
}

impl fmt::Debug for EvaluatorRefMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.evaluator.fmt(f)
    }
}
