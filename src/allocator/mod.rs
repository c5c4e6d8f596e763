//! Allocator Module - Page-Walk Bump Allocation
//!
//! Both typed surfaces (struct and raw data) reduce to one primitive:
//! walk the pages in index order, hand the request to the first active
//! page with room, promote a passive page when none has, and advance
//! that page's bump pointer.
//!
//! Allocation is the collection trigger: when occupancy would cross the
//! configured threshold the primitive first runs a cycle, and refuses
//! the request if the cycle freed nothing or occupancy stays above the
//! threshold. The occupancy gate runs twice, once on entry with the
//! unrounded request and again in the no-active-page branch, so a heap
//! that is full of live data refuses instead of thrashing.
//!
//! The relocation primitive `Heap::alloc_raw` shares the page walk
//! but never re-enters collection, and only ever considers active and
//! passive pages, never a page that is being evacuated.

use crate::error::{GcError, Result};
use crate::heap::page::{PageType, PAGE_SIZE};
use crate::heap::Heap;
use crate::logging::{self, GcEvent};
use crate::object::header;
use crate::util::alignment;
use crate::util::constants::MIN_ALLOC_SIZE;

/// Round a request up to the allocation grain
///
/// At least `MIN_ALLOC_SIZE` and word-aligned, so every object has room
/// for a forwarding header and every user-visible address stays
/// word-aligned.
fn round_alloc_size(bytes: usize) -> usize {
    alignment::word_align(bytes.max(MIN_ALLOC_SIZE))
}

impl Heap {
    /// Run a cycle if `bytes` more would cross the threshold
    ///
    /// Returns `true` when the allocation must be refused: the cycle
    /// freed nothing, or occupancy is still above the threshold.
    fn run_gc_if_above_threshold(&mut self, bytes: usize) -> Result<bool> {
        let occupancy =
            |used: usize, size: usize| (used + bytes) as f32 / size as f32;

        if occupancy(self.used(), self.size()) > self.config.gc_threshold {
            let cleaned = self.collect()?;
            if cleaned == 0 {
                return Ok(true);
            }
            if occupancy(self.used(), self.size()) > self.config.gc_threshold {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The allocation primitive: reserve `bytes` of raw object space
    ///
    /// Returns the raw (pre-header) address. Does not touch the
    /// allocation map; the typed callers set the bit once they know
    /// where the user-visible pointer lands.
    fn alloc(&mut self, bytes: usize) -> Result<usize> {
        if self.run_gc_if_above_threshold(bytes)? {
            return Err(self.refuse(bytes));
        }

        let bytes = round_alloc_size(bytes);

        let mut target = None;
        let mut index = self.find_next_active_page(0);
        while let Some(i) = index {
            if self.pages[i].avail() > bytes {
                target = Some(i);
                break;
            }
            index = self.find_next_active_page(i + 1);
        }

        let page_index = match target {
            Some(i) => i,
            None => {
                if self.passive_page_count() <= 1 {
                    if self.run_gc_if_above_threshold(bytes)? {
                        return Err(self.refuse(bytes));
                    }
                    if self.passive_page_count() <= 1 {
                        return Err(self.refuse(bytes));
                    }
                }
                let i = match self.first_passive_page() {
                    Some(i) => i,
                    None => return Err(self.refuse(bytes)),
                };
                log::trace!("promoting page {} to active", i);
                self.pages[i].set_type(PageType::Active);
                i
            },
        };

        Ok(self.pages[page_index].bump_by(bytes))
    }

    /// Record and build the refusal error for a `bytes` request
    fn refuse(&mut self, bytes: usize) -> GcError {
        self.stats.record_allocation_failure();
        logging::log_event(GcEvent::AllocationFailure {
            size: bytes,
            heap_used: self.used(),
        });
        GcError::OutOfMemory {
            requested: bytes,
            available: self.avail(),
        }
    }

    /// Allocate a struct described by a layout string
    ///
    /// The returned address points at the payload, just past the
    /// header; its allocation-map bit is set.
    ///
    /// # Errors
    /// `InvalidLayout` for a malformed layout string, `ObjectTooLarge`
    /// when the struct cannot fit in one page, `OutOfMemory` when the
    /// heap refuses.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pgc::Heap;
    ///
    /// let mut heap = Heap::with_size(4 * 2048)?;
    /// // A list node: one pointer, one long
    /// let node = heap.alloc_struct("*l")?;
    /// assert!(heap.is_live(node));
    /// # Ok::<(), pgc::GcError>(())
    /// ```
    pub fn alloc_struct(&mut self, layout: &str) -> Result<usize> {
        let id = self.layouts.intern(layout)?;
        let size = header::HEADER_SIZE + self.layouts.get(id)?.size();
        if size > PAGE_SIZE {
            return Err(GcError::ObjectTooLarge {
                size,
                max: PAGE_SIZE,
            });
        }

        let raw = self.alloc(size)?;
        let user = unsafe { header::install_struct(raw, id) };
        self.alloc_map.set(user, true)?;

        let used = self.used();
        self.stats.record_allocation(round_alloc_size(size), used);
        Ok(user)
    }

    /// Allocate `bytes` of raw data
    ///
    /// The returned address points at the payload, just past the
    /// header; its allocation-map bit is set. The payload contents are
    /// unspecified until the caller writes them.
    ///
    /// # Errors
    /// `InvalidArgument` for a zero-byte request, `ObjectTooLarge` when
    /// the object cannot fit in one page, `OutOfMemory` when the heap
    /// refuses.
    pub fn alloc_data(&mut self, bytes: usize) -> Result<usize> {
        if bytes == 0 {
            return Err(GcError::InvalidArgument(
                "zero-byte data allocation".to_string(),
            ));
        }

        let size = header::size_of_new_data(bytes);
        if size > PAGE_SIZE {
            return Err(GcError::ObjectTooLarge {
                size,
                max: PAGE_SIZE,
            });
        }

        let raw = self.alloc(size)?;
        let user = unsafe { header::install_data(raw, bytes) };
        self.alloc_map.set(user, true)?;

        let used = self.used();
        self.stats.record_allocation(round_alloc_size(size), used);
        Ok(user)
    }

    /// Relocate the object at `src_user` into a fresh page
    ///
    /// Shares the page walk with `alloc` but never re-enters
    /// collection. Only active and passive pages are considered, never
    /// one being evacuated. Copies the header, installs a forwarding
    /// header at the source, copies the payload, and flips the
    /// allocation-map bits (destination before source, so the map never
    /// reports "neither").
    ///
    /// # Errors
    /// `EvacuationFailed` when no page can take the object; the heap
    /// cannot complete the cycle that requested the move.
    pub(crate) fn alloc_raw(&mut self, src_user: usize) -> Result<usize> {
        let raw_size = round_alloc_size(unsafe {
            header::size_of_existing(&self.layouts, src_user)?
        });

        let mut target = None;
        let mut index = self.find_next_active_page(0);
        while let Some(i) = index {
            if self.pages[i].avail() > raw_size {
                target = Some(i);
                break;
            }
            index = self.find_next_active_page(i + 1);
        }

        let page_index = match target {
            Some(i) => i,
            None => {
                let i = self.first_passive_page().ok_or_else(|| {
                    GcError::EvacuationFailed(format!(
                        "no page can take {} bytes for the object at {:#x}",
                        raw_size, src_user
                    ))
                })?;
                self.pages[i].set_type(PageType::Active);
                i
            },
        };

        let dst_raw = self.pages[page_index].bump_by(raw_size);

        // Payload size must be read before the source header is
        // replaced by the forwarding header.
        let data_size = unsafe { header::data_size_of_existing(&self.layouts, src_user)? };
        let dst_user = unsafe { header::copy(src_user, dst_raw) };
        unsafe {
            header::forward(src_user, dst_user);
            std::ptr::copy_nonoverlapping(
                src_user as *const u8,
                dst_user as *mut u8,
                data_size,
            );
        }

        self.alloc_map.set(dst_user, true)?;
        self.alloc_map.set(src_user, false)?;

        log::trace!(
            "relocated {:#x} -> {:#x} ({} bytes)",
            src_user,
            dst_user,
            data_size
        );
        Ok(dst_user)
    }
}
