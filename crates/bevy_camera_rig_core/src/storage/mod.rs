//! Arena storage for evaluator trees.
//!
//! Evaluators are written in place into allocation pages. When built with a precomputed
//! [`CameraNodeEvaluatorAllocationInfo`], a whole tree fits into one page of exactly the right
//! size and alignment. Without it, pages are chained as needed. Pages never move once allocated,
//! so evaluators stay at the same address until they are destroyed.

mod borrow;
mod page;

use std::{alloc::Layout, mem, ptr, ptr::NonNull};

use bevy::{
    log::{error, trace},
    reflect::Reflect,
};
use serde::{Deserialize, Serialize};

pub use borrow::{EvaluatorRef, EvaluatorRefMut};

use crate::{
    camera_node::CameraNodeRef,
    errors::{CameraRigError, CameraRigResult},
    evaluator::{CameraNodeEvaluator, EvaluatorHandle, builder::CameraNodeEvaluatorBuilder},
    type_registry::{CameraObjectTypeId, CameraObjectTypeRegistry},
};
use borrow::BorrowFlag;
use page::AllocationPage;

/// Capacity of pages allocated on demand, when no allocation info was given.
const DEFAULT_PAGE_CAPACITY: usize = 1024;
const DEFAULT_PAGE_ALIGN: usize = 16;

/// Memory requirements of a whole evaluator tree.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraNodeEvaluatorAllocationInfo {
    /// Bytes used by all evaluators, including alignment padding
    pub total_sizeof: usize,
    /// Alignment a single page needs for the tree to be laid out as predicted
    pub max_alignof: usize,
}

impl CameraNodeEvaluatorAllocationInfo {
    pub fn is_empty(&self) -> bool {
        self.total_sizeof == 0 || self.max_alignof == 0
    }

    /// Builds the tree rooted at `root` into a scratch storage and reports how much memory it
    /// used.
    pub fn compute(root: Option<&CameraNodeRef>) -> Self {
        let mut storage = CameraNodeEvaluatorStorage::default();
        storage.build_evaluator_tree(&CameraNodeEvaluatorTreeBuildParams {
            root_camera_node: root,
            allocation_info: None,
        });
        storage.allocation_info()
    }
}

#[derive(Clone, Copy, Default)]
pub struct CameraNodeEvaluatorTreeBuildParams<'a> {
    pub root_camera_node: Option<&'a CameraNodeRef>,
    pub allocation_info: Option<CameraNodeEvaluatorAllocationInfo>,
}

struct StoredEvaluator {
    ptr: NonNull<dyn CameraNodeEvaluator>,
    type_id: CameraObjectTypeId,
    alive: bool,
    borrow: BorrowFlag,
}

/// Owns the memory of one or more evaluator trees, and every evaluator constructed into it.
#[derive(Default)]
pub struct CameraNodeEvaluatorStorage {
    pages: Vec<AllocationPage>,
    objects: Vec<StoredEvaluator>,
    /// Bumped every time the storage is cleared, so that old handles can't resolve
    generation: u32,
    /// Offset the next allocation would land at if everything lived in a single page
    layout_cursor: usize,
    max_alignof: usize,
}

// SAFETY: evaluators are `Send + Sync`, and all shared access to them goes through the
// per-object atomic borrow flags.
unsafe impl Send for CameraNodeEvaluatorStorage {}
unsafe impl Sync for CameraNodeEvaluatorStorage {}

impl CameraNodeEvaluatorStorage {
    /// Builds the evaluator tree for `params.root_camera_node`, returning the handle of the root
    /// evaluator, or `None` if there is no root node.
    pub fn build_evaluator_tree(
        &mut self,
        params: &CameraNodeEvaluatorTreeBuildParams,
    ) -> Option<EvaluatorHandle> {
        if let Some(allocation_info) = params.allocation_info {
            if !allocation_info.is_empty() {
                self.reserve_page(allocation_info);
            }
        }

        CameraNodeEvaluatorBuilder::new(self).build_evaluator(params.root_camera_node)
    }

    /// Drops every evaluator constructed in this storage, in construction order.
    ///
    /// Pages are released if `free_allocations` is set, otherwise they are kept around to be
    /// reused by the next build. All previously returned handles become stale.
    pub fn destroy_evaluator_tree(&mut self, free_allocations: bool) {
        for object in self.objects.iter_mut() {
            if object.alive {
                object.alive = false;
                // SAFETY: the object was written in `construct` and has not been dropped yet.
                unsafe { ptr::drop_in_place(object.ptr.as_ptr()) };
            }
        }
        self.objects.clear();

        if free_allocations {
            self.pages.clear();
        } else {
            self.pages.iter_mut().for_each(AllocationPage::reset);
        }

        self.layout_cursor = 0;
        self.max_alignof = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Destroys the evaluator tree rooted at `root`, depth first and in construction order.
    ///
    /// Memory is not released, but it is zeroed out if `reset_memory` is set. Handles to
    /// evaluators that were already destroyed are skipped.
    pub fn destroy_evaluator_subtree(&mut self, root: EvaluatorHandle, reset_memory: bool) {
        let registry = CameraObjectTypeRegistry::read();

        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Ok(index) = self.live_index(handle) else {
                continue;
            };
            let object = &mut self.objects[index];

            // SAFETY: the object is alive and `&mut self` guarantees nobody borrows it.
            let children = unsafe { object.ptr.as_ref() }.children();
            stack.extend(children.into_iter().rev().flatten());

            let type_info = match registry.try_type_info(object.type_id) {
                Ok(type_info) => type_info,
                Err(err) => {
                    error!("Can't destroy camera evaluator {handle:?}: {err}");
                    debug_assert!(false, "camera evaluator type {:?} missing", object.type_id);
                    continue;
                }
            };

            object.alive = false;
            // SAFETY: the object is alive and not borrowed, see above.
            unsafe { ptr::drop_in_place(object.ptr.as_ptr()) };
            if reset_memory && type_info.sizeof > 0 {
                // SAFETY: the object occupied `sizeof` bytes inside one of our pages.
                unsafe { ptr::write_bytes(object.ptr.cast::<u8>().as_ptr(), 0, type_info.sizeof) };
            }
        }
    }

    /// Memory used by everything built into this storage since it was last cleared.
    pub fn allocation_info(&self) -> CameraNodeEvaluatorAllocationInfo {
        CameraNodeEvaluatorAllocationInfo {
            total_sizeof: self.layout_cursor,
            max_alignof: self.max_alignof,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of evaluators constructed and not yet destroyed.
    pub fn live_evaluator_count(&self) -> usize {
        self.objects.iter().filter(|object| object.alive).count()
    }

    pub fn contains(&self, handle: EvaluatorHandle) -> bool {
        self.live_index(handle).is_ok()
    }

    /// Shared access to an evaluator, refused while it is mutably borrowed.
    pub fn try_borrow(&self, handle: EvaluatorHandle) -> CameraRigResult<EvaluatorRef<'_>> {
        let object = &self.objects[self.live_index(handle)?];
        if !object.borrow.try_acquire_shared() {
            return Err(CameraRigError::EvaluatorAlreadyBorrowed(handle));
        }
        // SAFETY: the shared borrow flag is held until the guard is dropped.
        let evaluator = unsafe { object.ptr.as_ref() };
        Ok(EvaluatorRef::new(evaluator, &object.borrow))
    }

    /// Exclusive access to an evaluator, refused while it is borrowed in any way.
    pub fn try_borrow_mut(&self, handle: EvaluatorHandle) -> CameraRigResult<EvaluatorRefMut<'_>> {
        let object = &self.objects[self.live_index(handle)?];
        if !object.borrow.try_acquire_exclusive() {
            return Err(CameraRigError::EvaluatorAlreadyBorrowed(handle));
        }
        // SAFETY: the exclusive borrow flag is held until the guard is dropped.
        let evaluator = unsafe { &mut *object.ptr.as_ptr() };
        Ok(EvaluatorRefMut::new(evaluator, &object.borrow))
    }

    pub fn get_mut(
        &mut self,
        handle: EvaluatorHandle,
    ) -> Option<&mut (dyn CameraNodeEvaluator + 'static)> {
        let index = self.live_index(handle).ok()?;
        // SAFETY: `&mut self` means no guard is alive.
        Some(unsafe { &mut *self.objects[index].ptr.as_ptr() })
    }

    pub(crate) fn raw_evaluator(
        &self,
        handle: EvaluatorHandle,
    ) -> Option<NonNull<dyn CameraNodeEvaluator>> {
        let index = self.live_index(handle).ok()?;
        Some(self.objects[index].ptr)
    }

    pub(crate) fn construct<T: CameraNodeEvaluator>(
        &mut self,
        type_id: CameraObjectTypeId,
        evaluator: T,
    ) -> EvaluatorHandle {
        let ptr: NonNull<T> = if mem::size_of::<T>() == 0 {
            NonNull::dangling()
        } else {
            self.allocate(Layout::new::<T>()).cast()
        };
        // SAFETY: `ptr` is valid for writes and aligned for `T`.
        unsafe { ptr.as_ptr().write(evaluator) };

        let index = self.objects.len() as u32;
        self.objects.push(StoredEvaluator {
            ptr,
            type_id,
            alive: true,
            borrow: BorrowFlag::default(),
        });

        EvaluatorHandle {
            index,
            generation: self.generation,
        }
    }

    fn live_index(&self, handle: EvaluatorHandle) -> CameraRigResult<usize> {
        let index = handle.index as usize;
        match self.objects.get(index) {
            Some(object) if object.alive && handle.generation == self.generation => Ok(index),
            _ => Err(CameraRigError::StaleEvaluatorHandle(handle)),
        }
    }

    fn reserve_page(&mut self, allocation_info: CameraNodeEvaluatorAllocationInfo) {
        let fits = self.pages.last().is_some_and(|page| {
            page.remaining() >= allocation_info.total_sizeof
                && page.align() >= allocation_info.max_alignof
        });
        if fits {
            return;
        }

        match Layout::from_size_align(allocation_info.total_sizeof, allocation_info.max_alignof) {
            Ok(layout) => {
                trace!(
                    "Allocating camera evaluator page of {} bytes (align {})",
                    layout.size(),
                    layout.align()
                );
                self.pages.push(AllocationPage::new(layout));
            }
            Err(err) => error!("Invalid camera evaluator allocation info {allocation_info:?}: {err}"),
        }
    }

    fn allocate(&mut self, layout: Layout) -> NonNull<u8> {
        self.layout_cursor = self.layout_cursor.next_multiple_of(layout.align()) + layout.size();
        self.max_alignof = self.max_alignof.max(layout.align());

        if let Some(ptr) = self.pages.last_mut().and_then(|page| page.try_allocate(layout)) {
            return ptr;
        }

        let page_layout = Layout::from_size_align(
            DEFAULT_PAGE_CAPACITY.max(layout.size()),
            DEFAULT_PAGE_ALIGN.max(layout.align()),
        )
        .unwrap_or(layout);
        trace!(
            "Chaining camera evaluator page of {} bytes (align {})",
            page_layout.size(),
            page_layout.align()
        );

        let mut page = AllocationPage::new(page_layout);
        let Some(ptr) = page.try_allocate(layout) else {
            std::alloc::handle_alloc_error(layout);
        };
        self.pages.push(page);
        ptr
    }
}

impl Drop for CameraNodeEvaluatorStorage {
    fn drop(&mut self) {
        self.destroy_evaluator_tree(true);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        camera_node::CameraNode,
        evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
        evaluator::tree::CameraNodeEvaluatorTree,
    };

    /// A node with any number of children, counting how many of its evaluators get dropped.
    #[derive(Debug)]
    struct TestNode {
        children: Vec<CameraNodeRef>,
        drops: Arc<AtomicUsize>,
    }

    #[derive(Debug)]
    #[repr(align(16))]
    struct TestEvaluator {
        node: Arc<TestNode>,
        children: Vec<Option<EvaluatorHandle>>,
    }

    impl Drop for TestEvaluator {
        fn drop(&mut self) {
            self.node.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl CameraNode for TestNode {
        fn build_evaluator(
            self: Arc<Self>,
            builder: &mut CameraNodeEvaluatorBuilder,
        ) -> EvaluatorHandle {
            builder.construct(TestEvaluator {
                node: self,
                children: Vec::new(),
            })
        }
    }

    impl CameraNodeEvaluator for TestEvaluator {
        fn children(&self) -> Vec<Option<EvaluatorHandle>> {
            self.children.clone()
        }

        fn on_build(&mut self, builder: &mut CameraNodeEvaluatorBuilder) {
            let node = self.node.clone();
            self.children = node
                .children
                .iter()
                .map(|child| builder.build_evaluator(Some(child)))
                .collect();
        }

        fn on_run(
            &mut self,
            _params: &CameraNodeEvaluationParams,
            _tree: &CameraNodeEvaluatorTree,
            _result: &mut CameraNodeEvaluationResult,
        ) {
        }
    }

    fn node(children: Vec<CameraNodeRef>, drops: &Arc<AtomicUsize>) -> CameraNodeRef {
        CameraNodeRef::new(TestNode {
            children,
            drops: drops.clone(),
        })
    }

    fn chain(depth: usize, drops: &Arc<AtomicUsize>) -> CameraNodeRef {
        (0..depth).fold(node(vec![], drops), |child, _| node(vec![child], drops))
    }

    fn fan_out(width: usize, drops: &Arc<AtomicUsize>) -> CameraNodeRef {
        node((0..width).map(|_| node(vec![], drops)).collect(), drops)
    }

    fn build(root: &CameraNodeRef, storage: &mut CameraNodeEvaluatorStorage) -> EvaluatorHandle {
        storage
            .build_evaluator_tree(&CameraNodeEvaluatorTreeBuildParams {
                root_camera_node: Some(root),
                allocation_info: None,
            })
            .unwrap()
    }

    #[test]
    fn test_evaluator_layout() {
        assert_eq!(mem::size_of::<TestEvaluator>(), 32);
        assert_eq!(mem::align_of::<TestEvaluator>(), 16);
    }

    #[test]
    fn missing_root_builds_nothing() {
        let mut storage = CameraNodeEvaluatorStorage::default();
        let root = storage.build_evaluator_tree(&CameraNodeEvaluatorTreeBuildParams::default());
        assert!(root.is_none());
        assert_eq!(storage.page_count(), 0);
        assert_eq!(
            storage.allocation_info(),
            CameraNodeEvaluatorAllocationInfo::default()
        );

        storage.destroy_evaluator_tree(true);
        storage.destroy_evaluator_tree(false);
    }

    #[test]
    fn destroying_drops_each_evaluator_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let root = node(vec![chain(3, &drops), fan_out(5, &drops)], &drops);

        let mut storage = CameraNodeEvaluatorStorage::default();
        build(&root, &mut storage);
        assert_eq!(storage.live_evaluator_count(), 11);
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        storage.destroy_evaluator_tree(true);
        assert_eq!(drops.load(Ordering::SeqCst), 11);
        assert_eq!(storage.page_count(), 0);

        storage.destroy_evaluator_tree(true);
        drop(storage);
        assert_eq!(drops.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn dropping_the_storage_destroys_the_tree() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut storage = CameraNodeEvaluatorStorage::default();
        build(&fan_out(4, &drops), &mut storage);
        drop(storage);
        assert_eq!(drops.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn dry_run_predicts_a_single_page() {
        let drops = Arc::new(AtomicUsize::new(0));
        for root in [
            node(vec![], &drops),
            chain(40, &drops),
            fan_out(64, &drops),
            node(vec![chain(8, &drops), fan_out(8, &drops)], &drops),
        ] {
            let allocation_info = CameraNodeEvaluatorAllocationInfo::compute(Some(&root));
            assert!(!allocation_info.is_empty());

            let mut storage = CameraNodeEvaluatorStorage::default();
            storage.build_evaluator_tree(&CameraNodeEvaluatorTreeBuildParams {
                root_camera_node: Some(&root),
                allocation_info: Some(allocation_info),
            });
            assert_eq!(storage.page_count(), 1);
            assert_eq!(storage.allocation_info(), allocation_info);
        }
    }

    #[test]
    fn root_with_two_children_fits_the_predicted_page() {
        let drops = Arc::new(AtomicUsize::new(0));
        let root = fan_out(2, &drops);

        let allocation_info = CameraNodeEvaluatorAllocationInfo {
            total_sizeof: 96,
            max_alignof: 16,
        };
        assert_eq!(
            CameraNodeEvaluatorAllocationInfo::compute(Some(&root)),
            allocation_info
        );

        let mut storage = CameraNodeEvaluatorStorage::default();
        let handle = storage.build_evaluator_tree(&CameraNodeEvaluatorTreeBuildParams {
            root_camera_node: Some(&root),
            allocation_info: Some(allocation_info),
        });
        assert!(handle.is_some());
        assert_eq!(storage.page_count(), 1);

        storage.destroy_evaluator_tree(true);
        assert_eq!(storage.page_count(), 0);
        assert_eq!(drops.load(Ordering::SeqCst), 3);
        assert_eq!(
            storage.allocation_info(),
            CameraNodeEvaluatorAllocationInfo::default()
        );
    }

    #[test]
    fn oversized_allocation_info_still_uses_one_page() {
        let drops = Arc::new(AtomicUsize::new(0));
        let root = fan_out(1, &drops);

        let mut storage = CameraNodeEvaluatorStorage::default();
        let handle = storage.build_evaluator_tree(&CameraNodeEvaluatorTreeBuildParams {
            root_camera_node: Some(&root),
            allocation_info: Some(CameraNodeEvaluatorAllocationInfo {
                total_sizeof: 256,
                max_alignof: 32,
            }),
        });
        assert!(handle.is_some());
        assert_eq!(storage.page_count(), 1);
        assert_eq!(
            storage.allocation_info(),
            CameraNodeEvaluatorAllocationInfo {
                total_sizeof: 64,
                max_alignof: 16,
            }
        );
    }

    #[test]
    fn zero_allocation_info_allocates_no_page_up_front() {
        let mut storage = CameraNodeEvaluatorStorage::default();
        storage.build_evaluator_tree(&CameraNodeEvaluatorTreeBuildParams {
            root_camera_node: None,
            allocation_info: Some(CameraNodeEvaluatorAllocationInfo {
                total_sizeof: 0,
                max_alignof: 16,
            }),
        });
        assert_eq!(storage.page_count(), 0);
    }

    #[test]
    fn pages_are_chained_without_allocation_info() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut storage = CameraNodeEvaluatorStorage::default();
        build(&fan_out(100, &drops), &mut storage);
        assert!(storage.page_count() > 1);
        assert_eq!(storage.live_evaluator_count(), 101);
    }

    #[test]
    fn subtree_destruction_visits_every_node_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let shapes = [
            (node(vec![], &drops), 1),
            (chain(16, &drops), 17),
            (fan_out(32, &drops), 33),
            (node(vec![chain(2, &drops), fan_out(3, &drops)], &drops), 8),
        ];

        for (root, count) in shapes {
            drops.store(0, Ordering::SeqCst);
            let mut storage = CameraNodeEvaluatorStorage::default();
            let handle = build(&root, &mut storage);

            storage.destroy_evaluator_subtree(handle, true);
            assert_eq!(drops.load(Ordering::SeqCst), count);
            assert_eq!(storage.live_evaluator_count(), 0);
            assert!(!storage.contains(handle));

            // Already destroyed, nothing left to visit
            storage.destroy_evaluator_subtree(handle, true);
            storage.destroy_evaluator_tree(true);
            assert_eq!(drops.load(Ordering::SeqCst), count);
        }
    }

    #[test]
    fn subtree_destruction_leaves_siblings_alive() {
        let drops = Arc::new(AtomicUsize::new(0));
        let root = node(vec![chain(2, &drops), node(vec![], &drops)], &drops);
        let mut storage = CameraNodeEvaluatorStorage::default();
        let root_handle = build(&root, &mut storage);

        let first_child = storage.try_borrow(root_handle).unwrap().children()[0].unwrap();
        storage.destroy_evaluator_subtree(first_child, false);
        assert_eq!(drops.load(Ordering::SeqCst), 3);
        assert_eq!(storage.live_evaluator_count(), 2);
        assert!(storage.contains(root_handle));
    }

    #[test]
    fn handles_go_stale_after_destruction() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut storage = CameraNodeEvaluatorStorage::default();
        let handle = build(&node(vec![], &drops), &mut storage);
        assert!(storage.try_borrow(handle).is_ok());

        storage.destroy_evaluator_tree(false);
        assert_eq!(
            storage.try_borrow(handle).err(),
            Some(CameraRigError::StaleEvaluatorHandle(handle))
        );

        // The page is reused, but the old handle still doesn't resolve
        let new_handle = build(&node(vec![], &drops), &mut storage);
        assert_eq!(storage.page_count(), 1);
        assert!(!storage.contains(handle));
        assert!(storage.contains(new_handle));
    }

    #[test]
    fn conflicting_borrows_are_refused() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut storage = CameraNodeEvaluatorStorage::default();
        let handle = build(&node(vec![], &drops), &mut storage);

        let shared = storage.try_borrow(handle).unwrap();
        assert!(storage.try_borrow(handle).is_ok());
        assert_eq!(
            storage.try_borrow_mut(handle).err(),
            Some(CameraRigError::EvaluatorAlreadyBorrowed(handle))
        );
        drop(shared);

        let exclusive = storage.try_borrow_mut(handle).unwrap();
        assert!(storage.try_borrow(handle).is_err());
        drop(exclusive);
        assert!(storage.try_borrow_mut(handle).is_ok());
    }
}
