//! Marker Module - Conservative Roots, Precise Heap Traversal
//!
//! The two policies of the collector live side by side here and must
//! stay separated:
//!
//! - **Conservative on the stack**: any word between the captured stack
//!   top and the thread's stack ceiling whose value is a live
//!   user-visible address is treated as a root
//!   ([`stack_scan::StackScanner`]).
//! - **Precise on the heap**: struct headers name their pointer slots
//!   exactly, and the traversal follows only those
//!   (`roots::collect_roots`).
//!
//! The marker writes nothing but the transient "found" bits in object
//! headers, and clears them again before handing the root set to the
//! evacuator.

pub mod stack_scan;

pub(crate) mod roots;

pub use stack_scan::StackScanner;

pub(crate) use roots::{collect_roots, count_live_refs, RootSet};
