//! Error types for crossfire-memory
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use thiserror::Error;

#[cfg(feature = "logging")]
use crossfire_log::debug;

/// Result type for allocation operations
pub type AllocResult<T> = Result<T, AllocError>;

/// Allocation errors
///
/// Every strategy reports failures through these three kinds only.
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// No free region large enough for the request
    #[error("Out of memory: requested {requested} bytes{}", .available.map(|a| format!(", {a} available")).unwrap_or_default())]
    OutOfMemory {
        /// Bytes requested
        requested: usize,
        /// Bytes the strategy could still hand out, when it knows
        available: Option<usize>,
    },

    /// Growing an existing block failed
    #[error("Reallocation failed: {size} bytes with {align} byte alignment")]
    ReallocFailed {
        /// Requested new size
        size: usize,
        /// Requested alignment
        align: usize,
    },

    /// Zero-size request rejected
    #[error("Invalid allocation size: {size}")]
    InvalidSize {
        /// The rejected size
        size: usize,
    },
}

impl AllocError {
    /// Create an out of memory error
    pub fn out_of_memory(requested: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(requested, "allocation failed: out of memory");

        Self::OutOfMemory {
            requested,
            available: None,
        }
    }

    /// Create an out of memory error with available memory info
    pub fn out_of_memory_with_available(requested: usize, available: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(requested, available, "allocation failed: out of memory");

        Self::OutOfMemory {
            requested,
            available: Some(available),
        }
    }

    /// Create a reallocation failed error
    pub fn realloc_failed(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(size, align, "reallocation failed");

        Self::ReallocFailed { size, align }
    }

    /// Create an invalid size error
    pub fn invalid_size(size: usize) -> Self {
        Self::InvalidSize { size }
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfMemory { .. } => "MEM:ALLOC:OOM",
            Self::ReallocFailed { .. } => "MEM:ALLOC:REALLOC",
            Self::InvalidSize { .. } => "MEM:ALLOC:SIZE",
        }
    }

    /// Check if this is an out of memory error
    #[must_use]
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }

    /// Check if this is a failed reallocation
    #[must_use]
    pub fn is_realloc_failed(&self) -> bool {
        matches!(self, Self::ReallocFailed { .. })
    }

    /// Check if this is a rejected zero-size request
    #[must_use]
    pub fn is_invalid_size(&self) -> bool {
        matches!(self, Self::InvalidSize { .. })
    }
}
