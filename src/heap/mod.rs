//! Heap Management Module - Page-Partitioned Managed Region
//!
//! The heap owns one contiguous mapped region split into fixed-size
//! pages, an allocation map with one bit per word-sized slot, and the
//! layout registry backing struct headers.
//!
//! Heap Structure:
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 Managed region (mmap)                 │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐     │
//! │  │ Page 0  │ │ Page 1  │ │ Page 2  │ │   ...   │     │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘     │
//! └──────────────────────────────────────────────────────┘
//!   Page descriptors ── AllocationMap ── LayoutRegistry
//! ```
//!
//! All mutation is serialized through `&mut Heap`; a cycle is atomic
//! with respect to the single mutator. Allocation lives in
//! [`crate::allocator`], collection in [`crate::gc`].

pub mod alloc_map;
pub mod mapping;
pub mod page;

pub use alloc_map::AllocationMap;
pub use mapping::RegionMapping;
pub use page::{Page, PageType, PAGE_SIZE};

use crate::config::HeapConfig;
use crate::error::Result;
use crate::marker::stack_scan::{self, StackScanner};
use crate::object::header::{self, HeaderKind};
use crate::object::LayoutRegistry;
use crate::stats::GcStats;
use crate::util::constants::WORD_SIZE;

/// Heap - owner of the managed region and all collector state
///
/// Created with [`Heap::new`]; the backing mapping, page descriptors,
/// allocation map, and layout registry are released together when the
/// heap drops.
///
/// # Examples
///
/// ```rust
/// use pgc::{Heap, HeapConfig};
///
/// let mut heap = Heap::new(HeapConfig {
///     heap_size: 8 * 2048,
///     ..Default::default()
/// })?;
///
/// let addr = heap.alloc_data(32)?;
/// assert!(heap.is_live(addr));
/// # Ok::<(), pgc::GcError>(())
/// ```
pub struct Heap {
    /// Backing mapping; owns the region's memory
    pub(crate) mapping: RegionMapping,

    /// One descriptor per page, in address order
    pub(crate) pages: Vec<Page>,

    /// Live-pointer bitmap over the region
    pub(crate) alloc_map: AllocationMap,

    /// Interned struct shapes referenced by headers
    pub(crate) layouts: LayoutRegistry,

    /// Construction-time configuration
    pub(crate) config: HeapConfig,

    /// Collection and allocation statistics
    pub(crate) stats: GcStats,
}

impl Heap {
    /// Create a heap from a validated configuration
    ///
    /// # Errors
    /// `Configuration` when the geometry or threshold is invalid,
    /// `HeapInitialization` when the backing mapping cannot be created.
    pub fn new(config: HeapConfig) -> Result<Self> {
        config.validate()?;

        let mapping = RegionMapping::anonymous(config.heap_size)?;
        let base = mapping.base();
        let page_count = config.heap_size / PAGE_SIZE;

        let pages = (0..page_count)
            .map(|i| Page::new(base + i * PAGE_SIZE, PAGE_SIZE))
            .collect();

        let alloc_map = AllocationMap::new(base, WORD_SIZE, config.heap_size);
        let stats = GcStats::new(config.stats_enabled);

        log::debug!(
            "heap initialized: {} bytes, {} pages, threshold {}",
            config.heap_size,
            page_count,
            config.gc_threshold
        );

        Ok(Self {
            mapping,
            pages,
            alloc_map,
            layouts: LayoutRegistry::new(),
            config,
            stats,
        })
    }

    /// Create a heap of `bytes` with default collection settings
    pub fn with_size(bytes: usize) -> Result<Self> {
        Heap::new(HeapConfig {
            heap_size: bytes,
            ..Default::default()
        })
    }

    /// Release the heap
    ///
    /// Equivalent to dropping; provided for symmetry with
    /// [`Heap::delete_dbg`].
    pub fn delete(self) {}

    /// Release the heap after scrubbing dangling stack references
    ///
    /// Every stack word that the collector would have accepted as a
    /// root is overwritten with `dbg_value`, so use-after-free reads
    /// trip over a recognizable pattern instead of a stale address.
    #[inline(never)]
    pub fn delete_dbg(self, dbg_value: usize) {
        // Captured in this frame so the scrub helper's own locals stay
        // outside the scanned range.
        let stack_top: usize = 0;
        let top = std::hint::black_box(&stack_top as *const usize as usize);
        self.scrub_stack(top, dbg_value);
    }

    /// Overwrite accepted stack roots with `dbg_value`
    #[inline(never)]
    fn scrub_stack(&self, top: usize, dbg_value: usize) {
        let bottom = stack_scan::stack_ceiling();
        let scanner = StackScanner::new(top, bottom, self.base(), self.base() + self.size());

        for slot in scanner {
            if self.alloc_map.is_used(unsafe { *slot }) {
                unsafe { *slot = dbg_value };
            }
        }
    }

    // === Byte counters ===

    /// Total region size in bytes
    pub fn size(&self) -> usize {
        self.config.heap_size
    }

    /// Bytes handed out, summed over all pages
    pub fn used(&self) -> usize {
        self.pages.iter().map(Page::used).sum()
    }

    /// Bytes still free, summed over all pages
    pub fn avail(&self) -> usize {
        self.pages.iter().map(Page::avail).sum()
    }

    // === Inspection ===

    /// First address of the managed region
    pub fn base(&self) -> usize {
        self.mapping.base()
    }

    /// Check if an address falls inside the managed region
    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.base() && addr < self.base() + self.size()
    }

    /// Check if an address currently heads a live allocation
    pub fn is_live(&self, addr: usize) -> bool {
        self.alloc_map.is_used(addr)
    }

    /// Header kind of the live object at `addr`
    ///
    /// `None` when `addr` does not head a live allocation.
    pub fn header_kind(&self, addr: usize) -> Option<HeaderKind> {
        if !self.alloc_map.is_used(addr) {
            return None;
        }
        Some(unsafe { header::read(addr).kind() })
    }

    /// Number of pages in the region
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Current state of every page, in index order
    pub fn page_states(&self) -> Vec<PageType> {
        self.pages.iter().map(Page::page_type).collect()
    }

    /// Configured collection threshold
    pub fn threshold(&self) -> f32 {
        self.config.gc_threshold
    }

    /// Collection statistics
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    // === Convenience allocation ===

    /// Copy a string into heap data, including the trailing NUL
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pgc::Heap;
    ///
    /// let mut heap = Heap::with_size(4 * 2048)?;
    /// let addr = heap.strdup("hello")?;
    /// let copied = unsafe {
    ///     std::slice::from_raw_parts(addr as *const u8, 6)
    /// };
    /// assert_eq!(copied, &b"hello\0"[..]);
    /// # Ok::<(), pgc::GcError>(())
    /// ```
    pub fn strdup(&mut self, s: &str) -> Result<usize> {
        let bytes = s.as_bytes();
        let addr = self.alloc_data(bytes.len() + 1)?;

        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), addr as *mut u8, bytes.len());
            *((addr + bytes.len()) as *mut u8) = 0;
        }
        Ok(addr)
    }

    // === Page-table queries used by the allocator and collector ===

    /// Index of the page containing `addr`
    ///
    /// Caller guarantees `addr` is inside the region.
    pub(crate) fn page_index(&self, addr: usize) -> usize {
        (addr - self.base()) / PAGE_SIZE
    }

    /// First active page at or after `from`, in index order
    pub(crate) fn find_next_active_page(&self, from: usize) -> Option<usize> {
        (from..self.pages.len()).find(|&i| self.pages[i].page_type() == PageType::Active)
    }

    /// Number of passive pages
    pub(crate) fn passive_page_count(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| p.page_type() == PageType::Passive)
            .count()
    }

    /// First passive page, in index order
    pub(crate) fn first_passive_page(&self) -> Option<usize> {
        (0..self.pages.len()).find(|&i| self.pages[i].page_type() == PageType::Passive)
    }
}
