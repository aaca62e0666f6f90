//! Rounding modes for floating-point calculations.
//!
//! The hardware rounding mode lives in the same control register family as
//! the sticky exception flags (MXCSR on x86_64, FPCR on aarch64), so the raw
//! register access is shared with [`crate::fexcept`]. Setting a mode
//! propagates to every rayon worker thread: the worker pool is the benchmark
//! team, and a mode set only on the calling thread would not reach the
//! threads that execute the partitioned work.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// IEEE-754 rounding mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundMode {
    /// Round toward negative infinity.
    Downward,
    /// Round to nearest, ties to even.
    #[default]
    ToNearest,
    /// Round toward zero.
    TowardZero,
    /// Round toward positive infinity.
    Upward,
}

impl RoundMode {
    /// The canonical spelling of this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            RoundMode::Downward => "downward",
            RoundMode::ToNearest => "tonearest",
            RoundMode::TowardZero => "towardzero",
            RoundMode::Upward => "upward",
        }
    }

    /// The corresponding MPFR rounding mode.
    #[cfg(feature = "mpfr")]
    pub(crate) fn to_mpfr(self) -> rug::float::Round {
        match self {
            RoundMode::Downward => rug::float::Round::Down,
            RoundMode::ToNearest => rug::float::Round::Nearest,
            RoundMode::TowardZero => rug::float::Round::Zero,
            RoundMode::Upward => rug::float::Round::Up,
        }
    }
}

impl fmt::Display for RoundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "downward" => Ok(RoundMode::Downward),
            "tonearest" => Ok(RoundMode::ToNearest),
            "towardzero" => Ok(RoundMode::TowardZero),
            "upward" => Ok(RoundMode::Upward),
            _ => Err(crate::error::invalid_argument(format!(
                "unknown rounding mode `{}`",
                s
            ))),
        }
    }
}

/// Sets the rounding mode for subsequent floating-point calculations,
/// process-wide: on the calling thread and on every rayon worker.
///
/// Targets without rounding control accept only [`RoundMode::ToNearest`]
/// (the IEEE-754 default) and reject the directed modes.
pub fn set_round_mode(mode: RoundMode) -> Result<()> {
    #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
    {
        apply(mode);
        rayon::broadcast(|_| apply(mode));
        Ok(())
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        if mode == RoundMode::ToNearest {
            Ok(())
        } else {
            Err(crate::error::platform_error(format!(
                "rounding mode `{}` is not available on this target",
                mode
            )))
        }
    }
}

/// Applies the rounding mode to the current thread's control register.
#[cfg(target_arch = "x86_64")]
fn apply(mode: RoundMode) {
    use crate::fexcept::hw;

    // MXCSR rounding control, bits 13-14.
    const MXCSR_RC_SHIFT: u32 = 13;
    const MXCSR_RC_MASK: u32 = 0b11 << MXCSR_RC_SHIFT;

    let rc: u32 = match mode {
        RoundMode::ToNearest => 0b00,
        RoundMode::Downward => 0b01,
        RoundMode::Upward => 0b10,
        RoundMode::TowardZero => 0b11,
    };
    let csr = (hw::read_csr() & !MXCSR_RC_MASK) | (rc << MXCSR_RC_SHIFT);
    hw::write_csr(csr);
}

#[cfg(target_arch = "aarch64")]
fn apply(mode: RoundMode) {
    use crate::fexcept::hw;

    // FPCR RMode, bits 22-23.
    const FPCR_RMODE_SHIFT: u64 = 22;
    const FPCR_RMODE_MASK: u64 = 0b11 << FPCR_RMODE_SHIFT;

    let rmode: u64 = match mode {
        RoundMode::ToNearest => 0b00,
        RoundMode::Upward => 0b01,
        RoundMode::Downward => 0b10,
        RoundMode::TowardZero => 0b11,
    };
    let fpcr = (hw::read_fpcr() & !FPCR_RMODE_MASK) | (rmode << FPCR_RMODE_SHIFT);
    hw::write_fpcr(fpcr);
}
