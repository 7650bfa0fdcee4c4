//! Allocation tracking.
//!
//! Install `TrackingAllocator` as the `#[global_allocator]`, call
//! [`reset_allocation_counter`] before the measured region and
//! [`current_allocation`] after it. Counters are per thread, so concurrent
//! tests never see each other's allocations.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set the first time the tracking allocator serves a request.
static ACTIVE: AtomicBool = AtomicBool::new(false);

thread_local! {
    static ALLOC_BYTES: Cell<u64> = const { Cell::new(0) };
    static ALLOC_COUNT: Cell<u64> = const { Cell::new(0) };
}

/// `System` allocator that counts allocations made on the current thread.
pub struct TrackingAllocator;

#[inline]
fn record(size: usize) {
    let _ = ALLOC_BYTES.try_with(|b| b.set(b.get().wrapping_add(size as u64)));
    let _ = ALLOC_COUNT.try_with(|c| c.set(c.get().wrapping_add(1)));
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        ACTIVE.store(true, Ordering::Relaxed);
        record(layout.size());
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        ACTIVE.store(true, Ordering::Relaxed);
        record(layout.size());
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        record(new_size);
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

/// Whether `TrackingAllocator` is installed as the global allocator.
pub fn tracking_active() -> bool {
    ACTIVE.load(Ordering::Relaxed)
}

/// Zero this thread's counters.
pub fn reset_allocation_counter() {
    let _ = ALLOC_BYTES.try_with(|b| b.set(0));
    let _ = ALLOC_COUNT.try_with(|c| c.set(0));
}

/// `(bytes, count)` allocated on this thread since the last reset.
pub fn current_allocation() -> (u64, u64) {
    let bytes = ALLOC_BYTES.try_with(Cell::get).unwrap_or(0);
    let count = ALLOC_COUNT.try_with(Cell::get).unwrap_or(0);
    (bytes, count)
}
