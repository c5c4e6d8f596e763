//! Configuration Module - Heap Tuning Parameters
//!
//! Manages all configuration parameters for the collector.
//! The heap geometry is fixed at construction; collection behavior is
//! controlled by the threshold and stack mode.

use crate::heap::page::PAGE_SIZE;
use serde::Serialize;
use thiserror::Error;

/// Default managed-region size (256 pages)
pub const DEFAULT_HEAP_SIZE: usize = 256 * PAGE_SIZE;

/// Default occupancy fraction that arms collection on the next allocation
pub const DEFAULT_GC_THRESHOLD: f32 = 0.5;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid heap size: {0}")]
    InvalidHeapSize(String),

    #[error("Invalid GC threshold: {0}")]
    InvalidThreshold(String),
}

/// Main configuration for a managed heap
///
/// # Examples
///
/// ```rust
/// use pgc::HeapConfig;
///
/// // Default configuration
/// let config = HeapConfig::default();
/// assert!(config.validate().is_ok());
///
/// // Small heap that collects eagerly
/// let config = HeapConfig {
///     heap_size: 4 * 2048,
///     gc_threshold: 0.25,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct HeapConfig {
    /// Size of the managed region in bytes
    ///
    /// Must be a multiple of the page size and at least two pages: one
    /// page to mutate into and one to evacuate into.
    pub heap_size: usize,

    /// Occupancy fraction (0, 1] above which the next allocation runs a
    /// collection cycle before proceeding
    pub gc_threshold: f32,

    /// Pin pages directly referenced from the stack instead of moving them
    ///
    /// Conservative stack roots can be false positives; pinning trades
    /// reclamation for never rewriting a stack word that only looked
    /// like a pointer.
    pub unsafe_stack: bool,

    /// Enable verbose cycle logging to the global GC logger
    pub verbose: bool,

    /// Enable statistics collection
    pub stats_enabled: bool,
}

impl Default for HeapConfig {
    fn default() -> Self {
        HeapConfig {
            heap_size: DEFAULT_HEAP_SIZE,
            gc_threshold: DEFAULT_GC_THRESHOLD,
            unsafe_stack: false,
            verbose: false,
            stats_enabled: true,
        }
    }
}

impl HeapConfig {
    /// Validate configuration
    ///
    /// Checks the heap geometry and threshold preconditions.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pgc::HeapConfig;
    ///
    /// let config = HeapConfig {
    ///     heap_size: 2048, // one page is not enough
    ///     ..Default::default()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heap_size < 2 * PAGE_SIZE {
            return Err(ConfigError::InvalidHeapSize(format!(
                "heap_size must be at least {} bytes (two pages), got {}",
                2 * PAGE_SIZE,
                self.heap_size
            )));
        }

        if self.heap_size % PAGE_SIZE != 0 {
            return Err(ConfigError::InvalidHeapSize(format!(
                "heap_size must be a multiple of the page size ({}), got {}",
                PAGE_SIZE, self.heap_size
            )));
        }

        if !(self.gc_threshold > 0.0 && self.gc_threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold(format!(
                "gc_threshold must be in (0, 1], got {}",
                self.gc_threshold
            )));
        }

        Ok(())
    }

    /// Build configuration from environment variables
    ///
    /// Overrides defaults with:
    /// - `PGC_HEAP_SIZE` (bytes)
    /// - `PGC_GC_THRESHOLD` (fraction)
    /// - `PGC_UNSAFE_STACK` (`1` / `true`)
    /// - `PGC_VERBOSE` (`1` / `true`)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PGC_HEAP_SIZE") {
            match val.parse::<usize>() {
                Ok(size) => config.heap_size = size,
                Err(_) => log::warn!("ignoring unparsable PGC_HEAP_SIZE={}", val),
            }
        }

        if let Ok(val) = std::env::var("PGC_GC_THRESHOLD") {
            match val.parse::<f32>() {
                Ok(t) => config.gc_threshold = t,
                Err(_) => log::warn!("ignoring unparsable PGC_GC_THRESHOLD={}", val),
            }
        }

        if let Ok(val) = std::env::var("PGC_UNSAFE_STACK") {
            config.unsafe_stack = val == "1" || val.eq_ignore_ascii_case("true");
        }

        if let Ok(val) = std::env::var("PGC_VERBOSE") {
            config.verbose = val == "1" || val.eq_ignore_ascii_case("true");
        }

        config
    }
}
