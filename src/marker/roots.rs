//! Root Enumeration - From Stack Candidates to the Live Set
//!
//! Roots are the starting points of a cycle. The stack scan yields
//! candidate slots; the allocation map filters them to live
//! user-visible pointers; struct reference maps then expand the set
//! transitively through the heap.
//!
//! The enumeration runs in two passes over identical input:
//! 1. a counting pass that sizes the root array up front, and
//! 2. a filling pass that records the slots.
//!
//! Both passes mark visited structs with the header's "found" bit to
//! break reference cycles, and both leave every mark cleared again
//! before returning, so a cycle never observes marks from an earlier
//! pass.
//!
//! The filled array holds *slot addresses*, never pointer values:
//! `[0, stack_count)` are stack words, `[stack_count, len)` are pointer
//! slots inside heap objects. Writing a forwarded address through a
//! slot is what updates the stack and already-moved objects in place.

use crate::heap::Heap;
use crate::marker::stack_scan::StackScanner;
use crate::object::header::{self, HeaderKind};

/// RootSet - every discovered reference slot, stack roots first
pub(crate) struct RootSet {
    /// Slot addresses; `[0, stack_count)` live on the stack, the rest
    /// inside heap objects
    pub(crate) slots: Vec<*mut usize>,

    /// Number of leading stack slots
    pub(crate) stack_count: usize,
}

impl RootSet {
    /// Total number of recorded reference slots
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Scanner over the mutator-owned stack range of this heap
fn candidate_slots(heap: &Heap, top: usize) -> StackScanner {
    StackScanner::new(
        top,
        crate::marker::stack_scan::stack_ceiling(),
        heap.base(),
        heap.base() + heap.size(),
    )
}

/// Count every live reference reachable from the stack
///
/// Counts references (slots), not objects: an object pointed to by two
/// live slots contributes twice, exactly as it will occupy two entries
/// of the root array. Leaves all found marks cleared.
pub(crate) fn count_live_refs(heap: &Heap, top: usize) -> usize {
    let mut count = 0;

    for slot in candidate_slots(heap, top) {
        let value = unsafe { *slot };
        if heap.alloc_map.is_used(value) {
            count += 1;
            count += count_heap_refs_rec(heap, value);
        }
    }

    reset_found(heap, top);
    count
}

/// Recursive part of the counting pass
///
/// A struct without pointer slots is never marked, in either pass: the
/// mark only guards recursion, and there is nothing to recurse into.
fn count_heap_refs_rec(heap: &Heap, ptr: usize) -> usize {
    if unsafe { header::read(ptr).kind() } != HeaderKind::Struct {
        return 0;
    }

    let Ok(slot_addrs) = (unsafe { header::pointer_slots(&heap.layouts, ptr) }) else {
        return 0;
    };
    if slot_addrs.is_empty() {
        return 0;
    }
    unsafe { header::mark_found(ptr) };

    let mut result = 0;
    for slot_addr in slot_addrs {
        let child = unsafe { *(slot_addr as *const usize) };
        if heap.alloc_map.is_used(child) {
            result += 1;
            if !unsafe { header::is_found(child) } {
                result += count_heap_refs_rec(heap, child);
            }
        }
    }
    result
}

/// Clear found marks left by the counting pass
///
/// Re-walks the stack and recurses through still-marked children, so
/// exactly the objects the counting pass visited are unmarked.
fn reset_found(heap: &Heap, top: usize) {
    for slot in candidate_slots(heap, top) {
        let value = unsafe { *slot };
        if heap.alloc_map.is_used(value) {
            reset_found_rec(heap, value);
        }
    }
}

/// Recursive part of the mark reset
fn reset_found_rec(heap: &Heap, ptr: usize) {
    if unsafe { header::read(ptr).kind() } != HeaderKind::Struct {
        return;
    }

    let Ok(slot_addrs) = (unsafe { header::pointer_slots(&heap.layouts, ptr) }) else {
        return;
    };
    unsafe { header::clear_found(ptr) };

    for slot_addr in slot_addrs {
        let child = unsafe { *(slot_addr as *const usize) };
        if heap.alloc_map.is_used(child) && unsafe { header::is_found(child) } {
            reset_found_rec(heap, child);
        }
    }
}

/// Fill the root array: stack roots first, then interior references
///
/// `expected` is the counting pass result, used to size the array in
/// one allocation. Found marks are cleared through the array before
/// returning.
pub(crate) fn collect_roots(heap: &Heap, top: usize, expected: usize) -> RootSet {
    let mut slots: Vec<*mut usize> = Vec::with_capacity(expected);

    for slot in candidate_slots(heap, top) {
        if heap.alloc_map.is_used(unsafe { *slot }) {
            slots.push(slot);
        }
    }
    let stack_count = slots.len();

    for i in 0..stack_count {
        let value = unsafe { *slots[i] };
        collect_heap_refs_rec(heap, value, &mut slots);
    }

    // Reset marks through the array: every marked object is some
    // entry's value.
    for &slot in &slots {
        let value = unsafe { *slot };
        if unsafe { header::read(value).kind() } == HeaderKind::Struct {
            unsafe { header::clear_found(value) };
        }
    }

    RootSet { slots, stack_count }
}

/// Recursive part of the filling pass
///
/// Pushes every live child slot of `ptr`, then recurses into children
/// not yet visited. Entries pushed here sit after `ptr`'s own entry, so
/// the evacuator's offset patch only ever touches higher indices.
fn collect_heap_refs_rec(heap: &Heap, ptr: usize, out: &mut Vec<*mut usize>) {
    if unsafe { header::read(ptr).kind() } != HeaderKind::Struct {
        return;
    }

    let Ok(slot_addrs) = (unsafe { header::pointer_slots(&heap.layouts, ptr) }) else {
        return;
    };
    if slot_addrs.is_empty() {
        return;
    }
    unsafe { header::mark_found(ptr) };

    let first_child = out.len();
    for slot_addr in slot_addrs {
        let child = unsafe { *(slot_addr as *const usize) };
        if heap.alloc_map.is_used(child) {
            out.push(slot_addr as *mut usize);
        }
    }

    let last_child = out.len();
    for idx in first_child..last_child {
        let child = unsafe { *out[idx] };
        if !unsafe { header::is_found(child) } {
            collect_heap_refs_rec(heap, child, out);
        }
    }
}
