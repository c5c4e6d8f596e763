//! GC Core Module - Collection Cycle Management
//!
//! One cycle, run on the mutator's own stack:
//!
//! 1. **Demarcate** - every active page becomes a transition page.
//! 2. **Enumerate roots** - two stack passes: count, then fill the root
//!    array; struct reference maps expand the array transitively.
//! 3. **Pin (unsafe mode)** - pages directly referenced from the stack
//!    are reclassified unsafe and stay put.
//! 4. **Evacuate** - survivors of each transition page move to fresh
//!    pages; forwarding addresses heal every recorded reference.
//! 5. **Reset** - scanned pages return to the passive pool; unsafe
//!    pages return to active.
//! 6. **Report** - bytes reclaimed (`used before - used after`).
//!
//! The collector keeps no state between cycles; the only transient
//! marks are the headers' "found" bits, cleared before the root array
//! is handed to the evacuator.

use crate::error::Result;
use crate::heap::page::PageType;
use crate::heap::Heap;
use crate::logging::{self, GcEvent};
use crate::marker;
use crate::relocate;
use crate::stats::GcTimer;

/// How a cycle treats pages referenced directly from the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionMode {
    /// Move everything; stack words are rewritten to forwarded
    /// addresses
    SafeStack,
    /// Pin stack-referenced pages in place; a conservative false
    /// positive then never rewrites an innocent stack word
    UnsafeStack,
}

impl Heap {
    /// Run a collection cycle in the heap's configured mode
    ///
    /// Returns the number of bytes reclaimed. A cycle that reclaims
    /// nothing still succeeds and reports zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pgc::Heap;
    ///
    /// let mut heap = Heap::with_size(4 * 2048)?;
    /// heap.alloc_data(64)?;
    /// // The allocation above is still referenced from this frame, so
    /// // a cycle keeps it alive.
    /// let reclaimed = heap.collect()?;
    /// assert_eq!(heap.used() + heap.avail(), heap.size());
    /// # let _ = reclaimed;
    /// # Ok::<(), pgc::GcError>(())
    /// ```
    pub fn collect(&mut self) -> Result<usize> {
        let mode = if self.config.unsafe_stack {
            CollectionMode::UnsafeStack
        } else {
            CollectionMode::SafeStack
        };
        self.collect_with_mode(mode)
    }

    /// Run a collection cycle in an explicit mode
    ///
    /// The high-water mark for the stack scan is captured in this
    /// frame, so every caller-owned frame is scanned and none of the
    /// collector's own callees are.
    #[inline(never)]
    pub fn collect_with_mode(&mut self, mode: CollectionMode) -> Result<usize> {
        let stack_top: usize = 0;
        let top = std::hint::black_box(&stack_top as *const usize as usize);
        self.run_cycle(top, mode)
    }

    /// The cycle proper, bounded above by `top`
    #[inline(never)]
    fn run_cycle(&mut self, top: usize, mode: CollectionMode) -> Result<usize> {
        let timer = GcTimer::new();
        let used_before = self.used();
        let cycle = self.stats.cycles() + 1;

        if self.config.verbose {
            logging::log_event(GcEvent::CycleStart {
                cycle,
                unsafe_stack: mode == CollectionMode::UnsafeStack,
                used_bytes: used_before,
            });
        }

        // Demarcate: every active page is now up for evacuation.
        for page in &mut self.pages {
            if page.page_type() == PageType::Active {
                page.set_type(PageType::Transition);
            }
        }

        // Enumerate roots: count, then fill.
        let expected = marker::count_live_refs(self, top);
        let mut roots = marker::collect_roots(self, top, expected);

        log::debug!(
            "cycle {}: {} stack roots, {} live references",
            cycle,
            roots.stack_count,
            roots.len()
        );
        if self.config.verbose {
            logging::log_event(GcEvent::RootScan {
                stack_roots: roots.stack_count,
                live_refs: roots.len(),
            });
        }

        if mode == CollectionMode::UnsafeStack {
            self.pin_stack_pages(&roots);
        }

        relocate::evacuate(self, &mut roots)?;

        // Unpin: stack-pinned pages keep their contents and stay
        // allocatable.
        for page in &mut self.pages {
            if page.page_type() == PageType::Unsafe {
                page.set_type(PageType::Active);
            }
        }

        let used_after = self.used();
        let reclaimed = used_before - used_after;
        self.stats.record_cycle(reclaimed, timer.elapsed());

        if self.config.verbose {
            logging::log_event(GcEvent::CycleEnd {
                cycle,
                duration_ms: timer.elapsed_ms(),
                reclaimed_bytes: reclaimed,
            });
            logging::log_event(GcEvent::HeapStats {
                used_bytes: used_after,
                total_bytes: self.size(),
                utilization: used_after as f64 / self.size() as f64,
            });
        }

        Ok(reclaimed)
    }

    /// Reclassify transition pages holding direct stack referents
    ///
    /// Only the leading stack entries of the root array are considered;
    /// interior references never pin a page.
    fn pin_stack_pages(&mut self, roots: &marker::RootSet) {
        for &slot in &roots.slots[..roots.stack_count] {
            let value = unsafe { *slot };
            if self.alloc_map.is_used(value) {
                let index = self.page_index(value);
                if self.pages[index].page_type() == PageType::Transition {
                    self.pages[index].set_type(PageType::Unsafe);
                }
            }
        }
    }
}
