//! Stress Tests
//!
//! Randomized allocate/collect churn with a rotating live window,
//! checking the structural invariants after every cycle.

mod common;

use common::*;
use pgc::{Heap, HeapConfig, PAGE_SIZE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Live window held in a stack array so every slot is a root
const WINDOW: usize = 8;

#[test]
fn randomized_churn_preserves_invariants() {
    let mut rng = StdRng::seed_from_u64(0x6163_7261_7465);
    let mut heap = Heap::new(HeapConfig {
        heap_size: 32 * PAGE_SIZE,
        gc_threshold: 0.6,
        ..Default::default()
    })
    .unwrap();

    // The window lives in this frame: each element is a stack word the
    // scanner sees, so the collector heals it in place. Seeds and
    // lengths are plain bytes, invisible to the scan.
    let mut window = [0usize; WINDOW];
    let mut seeds = [0u8; WINDOW];
    let mut lens = [0usize; WINDOW];
    std::hint::black_box(&mut window);

    for round in 0..200 {
        let payload = rng.gen_range(1..=192);
        let seed = rng.gen::<u8>();

        let addr = heap
            .alloc_data(payload)
            .unwrap_or_else(|e| panic!("round {}: allocation failed: {:?}", round, e));
        write_pattern(addr, payload, seed);

        let slot = round % WINDOW;
        window[slot] = addr;
        seeds[slot] = seed;
        lens[slot] = payload;

        if round % 25 == 24 {
            heap.collect().unwrap();

            assert_counters_consistent(&heap, "stress cycle");
            assert_no_transition_pages(&heap, "stress cycle");

            for (i, entry) in window.iter().enumerate() {
                let healed = reload(entry);
                if healed != 0 {
                    assert!(
                        heap.is_live(healed),
                        "round {}: window[{}] died across a cycle",
                        round,
                        i
                    );
                    assert_pattern(healed, lens[i], seeds[i], "windowed payload");
                }
            }
        }
    }

    assert!(heap.stats().cycles() >= 8);
}

#[test]
fn randomized_struct_graphs_survive() {
    let mut rng = StdRng::seed_from_u64(0x7067_6373);
    let mut heap = Heap::new(HeapConfig {
        heap_size: 32 * PAGE_SIZE,
        gc_threshold: 1.0,
        ..Default::default()
    })
    .unwrap();

    // Roots for a handful of two-slot nodes wired together at random.
    let mut nodes = [0usize; 6];
    std::hint::black_box(&mut nodes);

    for slot in nodes.iter_mut() {
        *slot = heap.alloc_struct("2*l").unwrap();
    }
    for i in 0..nodes.len() {
        let a = nodes[rng.gen_range(0..nodes.len())];
        set_pointer_field(nodes[i], 0, a);
        let b = nodes[rng.gen_range(0..nodes.len())];
        set_pointer_field(nodes[i], 8, b);
    }

    for _ in 0..10 {
        heap.collect().unwrap();

        for (i, entry) in nodes.iter().enumerate() {
            let healed = reload(entry);
            assert!(heap.is_live(healed), "node {} died", i);

            // Both outgoing edges must land on live nodes.
            assert!(heap.is_live(get_pointer_field(healed, 0)));
            assert!(heap.is_live(get_pointer_field(healed, 8)));
        }
    }

    assert_eq!(heap.used(), nodes.len() * (8 + 24));
}
