//! Error types for flopbench operations.
//!
//! This module defines custom error types that provide better error handling
//! than panicking, allowing applications to gracefully handle failures.

use std::fmt;

/// Errors that can occur while benchmarking or evaluating math operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A configuration error: unknown operation name, unparsable value, or a
    /// size/type mismatch between buffers and the selected operation.
    InvalidArgument {
        /// Human-readable error message.
        message: String,
    },
    /// Memory allocation for an aligned buffer failed.
    Allocation {
        /// The size that was requested to be allocated, in bytes.
        requested_size: usize,
        /// The alignment that was requested, in bytes.
        requested_alignment: usize,
        /// Human-readable error message.
        message: String,
    },
    /// The platform cannot satisfy a floating-point environment request,
    /// such as a rounding mode the hardware does not expose.
    Platform {
        /// Human-readable error message.
        message: String,
    },
    /// Error evaluation was requested but the crate was built without
    /// arbitrary-precision support (the `mpfr` feature). Callers should treat
    /// this as "error metrics unavailable" rather than a fatal condition.
    Unsupported,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument { message } => {
                write!(f, "Invalid argument: {}", message)
            }
            Error::Allocation {
                requested_size,
                requested_alignment,
                message,
            } => write!(
                f,
                "Memory allocation failed: {} (requested {} bytes with {} byte alignment)",
                message, requested_size, requested_alignment
            ),
            Error::Platform { message } => {
                write!(f, "Platform limitation: {}", message)
            }
            Error::Unsupported => {
                write!(f, "Built without arbitrary-precision support")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias for flopbench operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Creates an invalid-argument error.
pub fn invalid_argument(message: impl Into<String>) -> Error {
    Error::InvalidArgument {
        message: message.into(),
    }
}

/// Creates an allocation error.
pub fn allocation_error(size: usize, alignment: usize, message: impl Into<String>) -> Error {
    Error::Allocation {
        requested_size: size,
        requested_alignment: alignment,
        message: message.into(),
    }
}

/// Creates a platform-limitation error.
pub fn platform_error(message: impl Into<String>) -> Error {
    Error::Platform {
        message: message.into(),
    }
}
