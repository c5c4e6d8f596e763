//! Test Utilities for the Collector Test Suite
//!
//! Shared fixture and strict assertion helpers. The helpers only go
//! through the public API, so every check here is something a client
//! program could rely on too.

#![allow(dead_code)]

use pgc::{Heap, HeapConfig, PageType, PAGE_SIZE};

/// Build a heap of `pages` pages with an explicit threshold
pub fn heap_with_pages(pages: usize, gc_threshold: f32) -> Heap {
    Heap::new(HeapConfig {
        heap_size: pages * PAGE_SIZE,
        gc_threshold,
        ..Default::default()
    })
    .expect("heap construction must succeed with a valid config")
}

/// Build a heap that only collects when explicitly asked
pub fn quiet_heap(pages: usize) -> Heap {
    heap_with_pages(pages, 1.0)
}

/// Assert the byte-counter invariant `used + avail == size`
#[track_caller]
pub fn assert_counters_consistent(heap: &Heap, context: &str) {
    assert_eq!(
        heap.used() + heap.avail(),
        heap.size(),
        "{}: used ({}) + avail ({}) != size ({})",
        context,
        heap.used(),
        heap.avail(),
        heap.size()
    );
}

/// Assert that no page is left in the transition state
#[track_caller]
pub fn assert_no_transition_pages(heap: &Heap, context: &str) {
    let states = heap.page_states();
    assert!(
        states.iter().all(|&t| t != PageType::Transition),
        "{}: transition page left behind: {:?}",
        context,
        states
    );
}

/// Assert that an address is word-aligned and inside the heap
#[track_caller]
pub fn assert_valid_user_pointer(heap: &Heap, addr: usize, context: &str) {
    assert_eq!(
        addr % 8,
        0,
        "{}: address {:#x} is not word-aligned",
        context,
        addr
    );
    assert!(
        heap.contains(addr),
        "{}: address {:#x} outside the managed region",
        context,
        addr
    );
    assert!(
        heap.is_live(addr),
        "{}: address {:#x} has no allocation-map bit",
        context,
        addr
    );
}

/// Fill a data object's payload with a recognizable byte pattern
pub fn write_pattern(addr: usize, len: usize, seed: u8) {
    for i in 0..len {
        unsafe {
            *((addr + i) as *mut u8) = seed.wrapping_add(i as u8);
        }
    }
}

/// Check a data object's payload against [`write_pattern`]
#[track_caller]
pub fn assert_pattern(addr: usize, len: usize, seed: u8, context: &str) {
    for i in 0..len {
        let byte = unsafe { *((addr + i) as *const u8) };
        assert_eq!(
            byte,
            seed.wrapping_add(i as u8),
            "{}: payload byte {} corrupted at {:#x}",
            context,
            i,
            addr
        );
    }
}

/// Write a pointer into a struct's pointer slot
pub fn set_pointer_field(struct_addr: usize, field_offset: usize, target: usize) {
    unsafe {
        *((struct_addr + field_offset) as *mut usize) = target;
    }
}

/// Read a pointer out of a struct's pointer slot
pub fn get_pointer_field(struct_addr: usize, field_offset: usize) -> usize {
    unsafe { *((struct_addr + field_offset) as *const usize) }
}

/// Re-read a stack variable the collector may have healed in place
#[inline(never)]
pub fn reload(slot: &usize) -> usize {
    unsafe { std::ptr::read_volatile(slot) }
}

/// Clobber dead stack frames below the caller
///
/// Overwrites roughly 64KB of stack below the current frame with
/// zeros, so addresses left behind by returned helpers stop looking
/// like roots to the conservative scan.
#[inline(never)]
pub fn wash_stack() {
    let mut buf = [0usize; 8192];
    std::hint::black_box(&mut buf);
}
