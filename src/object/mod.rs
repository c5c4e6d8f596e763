//! Object Module - Headers, Layouts, and Reference Maps
//!
//! Defines the metadata side of every heap object: the 8-byte header
//! word, the layout-string grammar for struct shapes, and the bitmap of
//! pointer positions the collector traverses.

pub mod header;
pub mod layout;
pub mod refmap;

pub use header::{Header, HeaderKind, HEADER_SIZE};
pub use layout::{LayoutRegistry, StructLayout};
pub use refmap::ReferenceMap;
