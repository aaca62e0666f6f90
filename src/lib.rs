//! Throughput and accuracy benchmarking for elementary mathematical
//! functions.
//!
//! Resolves a named function (`cos`, `expf`, `lgamma`, ...) to a vectorized
//! transform over a typed buffer, drives it through a timed, team-parallel
//! repeat loop, and optionally measures worst-case error against MPFR
//! references (cargo feature `mpfr`). Hardware sticky floating-point
//! exception flags are captured across the run and canonicalized into a
//! label alongside the timing results.

pub mod accuracy;
pub mod alloc;
pub mod bench;
pub mod buffer;
pub mod error;
pub mod fexcept;
pub mod ops;
pub mod round;

pub use accuracy::{evaluate, ErrorMetrics};
pub use bench::{run, BenchReport};
pub use buffer::{InputBuffer, ResultBuffer};
pub use error::{Error, Result};
pub use fexcept::Fexcept;
pub use ops::{apply, Family, Operation, Width};
pub use round::{set_round_mode, RoundMode};

/// Default buffer alignment, in bytes. Covers a cache line on current
/// x86_64 and aarch64 parts.
pub const DEFAULT_ALIGNMENT: usize = 64;

/// Default working precision for error evaluation, in bits.
pub const DEFAULT_ERROR_PRECISION: u32 = 128;
