//! Region Mapping - Anonymous Backing for the Managed Heap
//!
//! The managed region lives in a single anonymous memory mapping.
//! Memory is zero-initialized by the OS and released when the mapping
//! drops with the owning heap.

use crate::error::{GcError, Result};
use memmap2::{MmapMut, MmapOptions};

/// RegionMapping - owner of the managed region's backing memory
pub struct RegionMapping {
    mmap: MmapMut,
}

impl RegionMapping {
    /// Create an anonymous zero-filled mapping of `size` bytes
    ///
    /// # Arguments
    /// * `size` - Region size in bytes (the OS rounds up to its own
    ///   page granularity; the heap only uses the requested prefix)
    pub fn anonymous(size: usize) -> Result<Self> {
        let mmap = MmapOptions::new().len(size).map_anon().map_err(|e| {
            GcError::HeapInitialization(format!("failed to map {} bytes: {}", size, e))
        })?;

        Ok(Self { mmap })
    }

    /// Base address of the mapping
    #[inline]
    pub fn base(&self) -> usize {
        self.mmap.as_ptr() as usize
    }

    /// Mapped size in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Check if the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}
