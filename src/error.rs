//! Error Module - Collector Error Types
//!
//! Defines all error types used by the collector.

use thiserror::Error;

/// Main error type for all collector operations
#[derive(Debug, Error)]
pub enum GcError {
    #[error("Out of memory: requested {requested} bytes, available {available} bytes")]
    OutOfMemory { requested: usize, available: usize },

    #[error("Heap initialization failed: {0}")]
    HeapInitialization(String),

    #[error("Invalid pointer address: {address:#x}")]
    InvalidPointer { address: usize },

    #[error("Object of {size} bytes does not fit in a single page of {max} bytes")]
    ObjectTooLarge { size: usize, max: usize },

    #[error("Invalid struct layout: {0}")]
    InvalidLayout(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Evacuation failed: {0}")]
    EvacuationFailed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Address {address:#x} outside the managed region")]
    OutOfRange { address: usize },

    #[error("Alignment error: address {address:#x} is not aligned to {alignment} bytes")]
    AlignmentError { address: usize, alignment: usize },
}

impl GcError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors may succeed on retry after the caller drops
    /// references and collects.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GcError::OutOfMemory { .. })
    }

    /// Check if this error indicates a bug in the caller or the collector
    pub fn is_bug(&self) -> bool {
        matches!(
            self,
            GcError::InvalidPointer { .. }
                | GcError::EvacuationFailed(_)
                | GcError::OutOfRange { .. }
                | GcError::AlignmentError { .. }
        )
    }
}

impl From<crate::config::ConfigError> for GcError {
    fn from(err: crate::config::ConfigError) -> Self {
        GcError::Configuration(err.to_string())
    }
}

/// Result type alias for collector operations
pub type Result<T> = std::result::Result<T, GcError>;
