//! Internal testing utilities

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::allocator::{Allocator, DefaultAllocator, Layout};

//  Test Allocator
//
//  An allocator specifically for testing:
//  -   Counts allocations, to check whether an operation allocated.
//  -   Checks that allocations and deallocations match.
#[derive(Default)]
pub struct TestAllocator {
    //  The actual allocator.
    allocator: DefaultAllocator,
    //  The number of allocations performed, ever.
    allocated: AtomicUsize,
    //  The number of deallocations performed, ever.
    deallocated: AtomicUsize,
    //  The number of bytes currently allocated.
    bytes: AtomicUsize,
}

impl TestAllocator {
    //  Returns the number of allocations performed.
    pub fn allocated(&self) -> usize { self.allocated.load(Ordering::Relaxed) }

    //  Returns the number of deallocations performed.
    pub fn deallocated(&self) -> usize { self.deallocated.load(Ordering::Relaxed) }

    //  Returns the number of allocations not yet deallocated.
    pub fn live(&self) -> usize { self.allocated() - self.deallocated() }

    //  Returns the number of bytes currently allocated.
    pub fn bytes(&self) -> usize { self.bytes.load(Ordering::Relaxed) }
}

impl Allocator for TestAllocator {
    unsafe fn allocate(&self, layout: Layout) -> *mut u8 {
        let result = self.allocator.allocate(layout);
        assert!(!result.is_null());

        self.allocated.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(layout.size(), Ordering::Relaxed);

        result
    }

    unsafe fn deallocate(&self, ptr: *mut u8, layout: Layout) {
        assert!(self.live() > 0, "Deallocating {:?} without allocation", ptr);

        self.allocator.deallocate(ptr, layout);

        self.deallocated.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_sub(layout.size(), Ordering::Relaxed);
    }
}

impl Drop for TestAllocator {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            assert_eq!(0, self.live(), "Leaked {} allocations", self.live());
        }
    }
}
