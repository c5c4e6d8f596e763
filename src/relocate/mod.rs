//! Relocate Module - Page Evacuation with In-Place Forwarding
//!
//! Walks the transition pages in ascending index order and, for each,
//! moves every rooted object out through `Heap::alloc_raw`. The root
//! array holds slot addresses, so writing the forwarded address through
//! an entry heals the stack word or heap field that produced it.
//!
//! Two ordering rules keep the patching sound:
//! - pages are visited in ascending index order, and
//! - within a page, entries are visited in array order, so the offset
//!   patch for a freshly moved struct only ever rewrites entries at the
//!   same or higher indices.
//!
//! After a page's last rooted object has moved, the page resets to
//! passive, its bump returns to the page start, and its slice of the
//! allocation map is wiped so no stale bit of a dead object survives
//! the cycle.

use crate::error::Result;
use crate::heap::page::{PageType, PAGE_SIZE};
use crate::heap::Heap;
use crate::logging::{self, GcEvent};
use crate::marker::RootSet;
use crate::object::header::{self, HeaderKind};

/// Evacuate every transition page, forwarding recorded references
///
/// On return no page is in the transition state; unsafe-pinned pages
/// are left for the caller to unpin.
pub(crate) fn evacuate(heap: &mut Heap, roots: &mut RootSet) -> Result<()> {
    for page_nr in 0..heap.pages.len() {
        if heap.pages[page_nr].page_type() != PageType::Transition {
            continue;
        }

        for ptr_index in 0..roots.slots.len() {
            let old = unsafe { *roots.slots[ptr_index] };
            if heap.page_index(old) != page_nr {
                continue;
            }

            let new = if unsafe { header::read(old).kind() } == HeaderKind::Forwarding {
                // Another entry already moved this object.
                unsafe { header::read(old).forwarding_address() }
            } else {
                let new = heap.alloc_raw(old)?;
                if unsafe { header::read(new).kind() } == HeaderKind::Struct {
                    let data_size =
                        unsafe { header::data_size_of_existing(&heap.layouts, new)? };
                    patch_interior_slots(
                        &mut roots.slots,
                        ptr_index,
                        old,
                        data_size,
                        new as isize - old as isize,
                    );
                }
                new
            };

            // Re-read the slot: the patch above retargets this very
            // entry when the object referenced itself.
            unsafe { *roots.slots[ptr_index] = new };
        }

        heap.alloc_map
            .clear_range(heap.pages[page_nr].start(), PAGE_SIZE);
        heap.pages[page_nr].set_type(PageType::Passive);
        heap.pages[page_nr].reset();
        logging::log_event(GcEvent::PageReclaimed { page: page_nr });
    }

    Ok(())
}

/// Shift root entries that point into a moved struct's old payload
///
/// Entries are slot addresses; any entry whose slot lay inside
/// `[old_user, old_user + data_size)` now lives in the copy, `offset`
/// bytes away. Only entries at `start_index` and beyond can still be
/// unvisited, so earlier entries are left alone.
fn patch_interior_slots(
    slots: &mut [*mut usize],
    start_index: usize,
    old_user: usize,
    data_size: usize,
    offset: isize,
) {
    let lower = old_user;
    let upper = old_user + data_size;

    for slot in slots[start_index..].iter_mut() {
        let addr = *slot as usize;
        if addr >= lower && addr < upper {
            *slot = (addr as isize + offset) as *mut usize;
        }
    }
}
