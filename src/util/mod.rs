//! Util Module - Shared Utilities
//!
//! Boundary arithmetic and the constants every component agrees on.

pub mod alignment;

/// Constants shared by every component
pub mod constants {
    /// Machine word size; the grain of the allocation map and of all
    /// alignment decisions (8 bytes)
    pub const WORD_SIZE: usize = 8;

    /// Smallest allocation handed out by the page allocator, header
    /// included (16 bytes)
    pub const MIN_ALLOC_SIZE: usize = 16;
}
