use std::{
    alloc::{self, Layout},
    ptr::NonNull,
};

/// A fixed block of memory, handed out front to back.
pub(super) struct AllocationPage {
    ptr: NonNull<u8>,
    layout: Layout,
    used: usize,
}

impl AllocationPage {
    /// `layout` must have a nonzero size.
    pub fn new(layout: Layout) -> Self {
        debug_assert!(layout.size() > 0);
        // SAFETY: the layout has a nonzero size.
        let ptr = unsafe { alloc::alloc(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            alloc::handle_alloc_error(layout);
        };
        Self {
            ptr,
            layout,
            used: 0,
        }
    }

    pub fn align(&self) -> usize {
        self.layout.align()
    }

    pub fn remaining(&self) -> usize {
        self.layout.size() - self.used
    }

    /// Carves out memory for `layout`, or returns `None` if the page is too full.
    pub fn try_allocate(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        let base = self.ptr.as_ptr() as usize;
        let start = (base + self.used).next_multiple_of(layout.align()) - base;
        let end = start.checked_add(layout.size())?;
        if end > self.layout.size() {
            return None;
        }

        self.used = end;
        // SAFETY: `start` is within the page.
        Some(unsafe { self.ptr.add(start) })
    }

    /// Marks the whole page as free again. Whatever lived in it must already be dropped.
    pub fn reset(&mut self) {
        self.used = 0;
    }
}

impl Drop for AllocationPage {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with the same layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}
