//! # pgc - Page-Based Compacting Garbage Collector
//!
//! pgc is a compacting, moving garbage collector backing a fixed-size
//! region of process memory for short-lived structured allocations. It
//! is precise on the heap and conservative on the stack: object headers
//! record exact pointer positions, while any machine-stack word that
//! looks like a live heap address is treated as a root.
//!
//! ## Overview
//!
//! - **Page-partitioned heap**: one mapped region split into fixed 2KB
//!   bump-allocated pages with a four-state lifecycle
//! - **Allocation map**: a bitmap marking every word-aligned address
//!   that currently heads a live allocation
//! - **Typed headers**: an 8-byte prefix per object recording a struct
//!   layout, a raw data size, or a forwarding address after relocation
//! - **Copying collection**: the stack is the initial root set; live
//!   objects relocate into fresh pages and every recorded reference is
//!   forwarded in place
//! - **Threshold-triggered**: allocation runs a cycle when occupancy
//!   would cross a configured fraction of the heap
//!
//! ## Quick Start
//!
//! ```rust
//! use pgc::{Heap, HeapConfig};
//!
//! fn main() -> Result<(), pgc::GcError> {
//!     let mut heap = Heap::new(HeapConfig {
//!         heap_size: 16 * 2048,
//!         gc_threshold: 0.5,
//!         ..Default::default()
//!     })?;
//!
//!     // A struct with one pointer field and one long field
//!     let node = heap.alloc_struct("*l")?;
//!     let blob = heap.alloc_data(32)?;
//!
//!     // Link the blob into the struct's pointer slot
//!     unsafe {
//!         *(node as *mut usize) = blob;
//!     }
//!
//!     // Both objects stay live across a cycle: `node` is on this
//!     // frame, and the blob is reachable through its pointer slot.
//!     heap.collect()?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Mutator                              │
//! │        alloc_struct / alloc_data / strdup                │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │
//! ┌───────────────────────────▼─────────────────────────────┐
//! │  Allocator: page walk, bump pointer, threshold gate      │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │ threshold crossed
//! ┌───────────────────────────▼─────────────────────────────┐
//! │  Collector                                               │
//! │  ┌────────────────────────────────────────────┐          │
//! │  │ Mark: conservative stack scan,             │          │
//! │  │       precise heap traversal               │          │
//! │  └────────────────────────────────────────────┘          │
//! │  ┌────────────────────────────────────────────┐          │
//! │  │ Relocate: copy survivors, install          │          │
//! │  │           forwarding, heal references      │          │
//! │  └────────────────────────────────────────────┘          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Safety
//!
//! pgc uses `unsafe` internally and hands out raw addresses. Users
//! must follow these rules:
//!
//! 1. **Keep references on the stack**: values stashed where the scan
//!    cannot see them (malloc heap, files, FFI) do not keep objects
//!    alive
//! 2. **Re-read addresses after a cycle**: objects move; the collector
//!    rewrites stack words in place, so always go through the variable
//!    rather than stale copies
//! 3. **Only store heap addresses in pointer slots**: the traversal
//!    dereferences every slot a layout declares
//!
//! The collector is single-threaded by design: one mutator, cycles run
//! to completion on the mutator's own stack. Sharing a heap across
//! threads requires external synchronization.
//!
//! ## Modules
//!
//! - [`allocator`]: page-walk bump allocation and the relocation
//!   primitive
//! - [`config`]: heap geometry and collection parameters
//! - [`error`]: error types for all operations
//! - [`gc`]: collection cycle orchestration
//! - [`heap`]: region mapping, pages, allocation map
//! - [`logging`]: structured collection events
//! - [`marker`]: conservative stack scan and root enumeration
//! - [`object`]: header codec, layout strings, reference maps
//! - [`relocate`]: page evacuation and pointer healing
//! - [`stats`]: cycle and allocation statistics
//! - [`util`]: alignment helpers and shared constants
//!
//! ## Limitations
//!
//! - Conservative stack scanning may keep dead objects alive while a
//!   matching bit pattern remains on the stack
//! - No allocation may exceed a single page (2048 bytes including its
//!   8-byte header)
//! - Unix only: the stack ceiling comes from the threading runtime

// Core collector modules
pub mod config;
pub mod error;
pub mod gc;

// Memory management subsystems
pub mod allocator;
pub mod heap;
pub mod object;

// Collection algorithm components
pub mod marker;
pub mod relocate;

// Monitoring
pub mod logging;
pub mod stats;

// Utilities
pub mod util;

// Re-export main types for convenience
pub use config::{ConfigError, HeapConfig};
pub use error::{GcError, Result};
pub use gc::CollectionMode;
pub use heap::{Heap, PageType, PAGE_SIZE};
pub use object::{HeaderKind, HEADER_SIZE};
pub use stats::{GcStats, GcSummary};
pub use util::constants::{MIN_ALLOC_SIZE, WORD_SIZE};

/// Crate version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create a heap with the default configuration
///
/// # Examples
///
/// ```rust
/// let mut heap = pgc::init()?;
/// let addr = heap.alloc_data(64)?;
/// assert!(heap.is_live(addr));
/// # Ok::<(), pgc::GcError>(())
/// ```
pub fn init() -> Result<Heap> {
    Heap::new(HeapConfig::default())
}

/// Create a heap with a custom configuration
///
/// # Examples
///
/// ```rust
/// use pgc::HeapConfig;
///
/// let config = HeapConfig {
///     heap_size: 64 * 2048,
///     gc_threshold: 0.8,
///     ..Default::default()
/// };
/// let heap = pgc::init_with_config(config)?;
/// assert_eq!(heap.size(), 64 * 2048);
/// # Ok::<(), pgc::GcError>(())
/// ```
pub fn init_with_config(config: HeapConfig) -> Result<Heap> {
    Heap::new(config)
}
