//! Collection Behavior Tests
//!
//! Survival of rooted objects, reclamation of garbage, pointer healing
//! across relocation, and the page state machine after a cycle.
//!
//! Conventions: addresses that must stay live are held in locals of
//! the test frame (the collector scans and heals them in place);
//! garbage is produced inside `#[inline(never)]` helpers whose dead
//! frames are scrubbed with `wash_stack` before collecting.

mod common;

use common::*;
use pgc::{CollectionMode, Heap, HeaderKind, HEADER_SIZE, MIN_ALLOC_SIZE};

/// Allocate `count` unreferenced data objects of `payload` bytes
#[inline(never)]
fn alloc_garbage(heap: &mut Heap, count: usize, payload: usize) {
    for _ in 0..count {
        heap.alloc_data(payload).expect("garbage allocation failed");
    }
}

/// Build an unreferenced linked chain of `len` nodes, head first
///
/// Each node is `"*3l"`: one pointer slot followed by 24 bytes of
/// payload. Returns the head's address.
#[inline(never)]
fn alloc_chain(heap: &mut Heap, len: usize) -> usize {
    let head = heap.alloc_struct("*3l").expect("chain allocation failed");
    let mut tail = head;
    for _ in 1..len {
        let node = heap.alloc_struct("*3l").expect("chain allocation failed");
        set_pointer_field(tail, 0, node);
        tail = node;
    }
    head
}

#[test]
fn collect_on_empty_heap_reclaims_nothing() {
    let mut heap = quiet_heap(4);
    let reclaimed = heap.collect().unwrap();

    assert_eq!(reclaimed, 0);
    assert_no_transition_pages(&heap, "empty-heap cycle");
    assert_counters_consistent(&heap, "empty-heap cycle");
}

#[test]
fn unreachable_garbage_is_reclaimed() {
    let mut heap = quiet_heap(4);
    alloc_garbage(&mut heap, 20, 56);
    let used_before = heap.used();
    assert_eq!(used_before, 20 * 64);

    wash_stack();
    let reclaimed = heap.collect().unwrap();

    assert_eq!(reclaimed, used_before);
    assert_eq!(heap.used(), 0);
    assert_no_transition_pages(&heap, "garbage-only cycle");
}

#[test]
fn rooted_data_survives_with_payload_intact() {
    let mut heap = quiet_heap(4);
    let blob = heap.alloc_data(48).unwrap();
    write_pattern(blob, 48, 0xA0);
    std::hint::black_box(&blob);

    // Remember the old location as an offset: a copy of the address
    // itself would be one more root and get healed along with `blob`.
    let old_offset = blob - heap.base();
    heap.collect().unwrap();

    let blob = reload(&blob);
    assert_ne!(
        blob - heap.base(),
        old_offset,
        "survivor must move out of its page"
    );
    assert!(heap.is_live(blob));
    assert!(!heap.is_live(heap.base() + old_offset));
    assert_pattern(blob, 48, 0xA0, "relocated payload");
    assert_counters_consistent(&heap, "after survival cycle");
}

#[test]
fn forwarded_pointer_field_is_healed() {
    let mut heap = quiet_heap(4);

    let s = heap.alloc_struct("*").unwrap();
    let b = heap.alloc_data(32).unwrap();
    set_pointer_field(s, 0, b);
    write_pattern(b, 32, 0x11);
    std::hint::black_box(&s);
    std::hint::black_box(&b);

    let s_old_offset = s - heap.base();
    heap.collect().unwrap();

    let s = reload(&s);
    let b = reload(&b);
    assert_ne!(s - heap.base(), s_old_offset);
    assert_eq!(
        get_pointer_field(s, 0),
        b,
        "struct's pointer slot must point at the blob's new address"
    );
    assert_pattern(b, 32, 0x11, "blob payload after healing");
}

#[test]
fn mutually_referencing_structs_survive() {
    let mut heap = quiet_heap(4);

    let a = heap.alloc_struct("*").unwrap();
    let b = heap.alloc_struct("*").unwrap();
    set_pointer_field(a, 0, b);
    set_pointer_field(b, 0, a);
    std::hint::black_box(&a);

    heap.collect().unwrap();

    let a = reload(&a);
    assert!(heap.is_live(a));

    let b_via_a = get_pointer_field(a, 0);
    assert!(heap.is_live(b_via_a));
    assert_eq!(
        get_pointer_field(b_via_a, 0),
        a,
        "cycle partner must point back at the relocated struct"
    );
}

#[test]
fn unreachable_chain_is_fully_reclaimed() {
    // The head address must never touch this frame, or the
    // conservative scan would keep the chain alive; the helper builds
    // the chain, drops the head, and its dead frame gets scrubbed.
    #[inline(never)]
    fn build_and_abandon_chain(heap: &mut Heap, len: usize) {
        let head = alloc_chain(heap, len);
        std::hint::black_box(head);
    }

    let mut heap = quiet_heap(8);

    build_and_abandon_chain(&mut heap, 5);
    let used_before = heap.used();
    // Node: 8 header + 32 payload
    assert_eq!(used_before, 5 * 40);

    wash_stack();

    let reclaimed = heap.collect().unwrap();
    assert!(
        reclaimed >= 5 * (MIN_ALLOC_SIZE + HEADER_SIZE),
        "reclaimed only {} bytes",
        reclaimed
    );
    assert_eq!(heap.used(), 0);
}

#[test]
fn rooted_chain_survives_whole() {
    let mut heap = quiet_heap(8);

    let head = alloc_chain(&mut heap, 5);
    std::hint::black_box(&head);

    heap.collect().unwrap();

    let head = reload(&head);
    let mut node = head;
    let mut visited = 0;
    while node != 0 {
        assert!(heap.is_live(node), "chain node {} died", visited);
        node = get_pointer_field(node, 0);
        visited += 1;
        assert!(visited <= 5, "chain became cyclic");
    }
    assert_eq!(visited, 5);
    assert_eq!(heap.used(), 5 * 40);
}

#[test]
fn second_collection_reclaims_zero() {
    let mut heap = quiet_heap(4);

    let keep = heap.alloc_struct("*2l").unwrap();
    std::hint::black_box(&keep);
    alloc_garbage(&mut heap, 10, 56);
    wash_stack();

    let first = heap.collect().unwrap();
    assert!(first > 0);

    let second = heap.collect().unwrap();
    assert_eq!(second, 0, "an unchanged heap has nothing to reclaim");

    let keep = reload(&keep);
    assert!(heap.is_live(keep));
}

#[test]
fn no_transition_page_survives_a_cycle() {
    let mut heap = quiet_heap(4);
    let keep = heap.alloc_data(40).unwrap();
    std::hint::black_box(&keep);
    alloc_garbage(&mut heap, 30, 56);

    heap.collect().unwrap();

    assert_no_transition_pages(&heap, "after mixed cycle");
    assert_counters_consistent(&heap, "after mixed cycle");
}

#[test]
fn threshold_crossing_allocation_triggers_a_cycle() {
    // Eight pages, collect at half occupancy. The garbage loop crosses
    // the threshold long before the heap is full, so at least one
    // cycle must have run and every allocation must have succeeded.
    let mut heap = heap_with_pages(8, 0.5);

    alloc_garbage(&mut heap, 200, 56);

    assert!(
        heap.stats().cycles() >= 1,
        "threshold never triggered a cycle"
    );
    assert_counters_consistent(&heap, "after threshold-driven cycles");
}

#[test]
fn collection_mode_unsafe_stack_pins_referenced_pages() {
    let mut heap = quiet_heap(4);

    let pinned = heap.alloc_data(32).unwrap();
    write_pattern(pinned, 32, 0x42);
    std::hint::black_box(&pinned);

    let before = pinned;
    heap.collect_with_mode(CollectionMode::UnsafeStack).unwrap();

    let after = reload(&pinned);
    assert_eq!(after, before, "stack-referenced page must not move");
    assert!(heap.is_live(after));
    assert_pattern(after, 32, 0x42, "pinned payload");
    assert_no_transition_pages(&heap, "after unsafe-stack cycle");
}

#[test]
fn unsafe_stack_mode_still_reclaims_unpinned_pages() {
    let mut heap = heap_with_pages(8, 1.0);

    let keep = heap.alloc_data(32).unwrap();
    std::hint::black_box(&keep);
    // Fill further pages with garbage; they hold no stack referents.
    alloc_garbage(&mut heap, 60, 56);
    wash_stack();

    let used_before = heap.used();
    let reclaimed = heap.collect_with_mode(CollectionMode::UnsafeStack).unwrap();

    assert!(reclaimed > 0, "unpinned garbage pages must be reclaimed");
    assert!(heap.used() < used_before);
    let keep = reload(&keep);
    assert!(heap.is_live(keep));
}

#[test]
fn headers_of_survivors_stay_well_formed() {
    let mut heap = quiet_heap(4);

    let s = heap.alloc_struct("*i").unwrap();
    let d = heap.alloc_data(24).unwrap();
    set_pointer_field(s, 0, d);
    std::hint::black_box(&s);
    std::hint::black_box(&d);

    heap.collect().unwrap();
    heap.collect().unwrap();

    let s = reload(&s);
    let d = reload(&d);
    assert_eq!(heap.header_kind(s), Some(HeaderKind::Struct));
    assert_eq!(heap.header_kind(d), Some(HeaderKind::Data));
}
