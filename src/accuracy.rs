//! Worst-case error evaluation against arbitrary-precision references.
//!
//! Each benchmarked result is compared to a reference recomputed with MPFR
//! (through the `rug` crate) at a configurable working precision, strictly
//! higher than either element width in any realistic configuration. The
//! evaluator is single-threaded and independent of the timing phase; it only
//! reads the input and result buffers.
//!
//! Everything here requires the `mpfr` cargo feature. Without it,
//! [`evaluate`] reports [`crate::error::Error::Unsupported`], which callers
//! treat as "error metrics unavailable" rather than a failure.

use crate::buffer::{InputBuffer, ResultBuffer};
use crate::error::Result;
use crate::ops::Operation;
use crate::round::RoundMode;

/// Worst-case error metrics for one benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMetrics {
    /// Maximum absolute error across all elements.
    pub max_abs_error: f64,
    /// Maximum relative error across all elements.
    pub max_rel_error: f64,
    /// Canonical label for the MPFR exception flags accumulated over the
    /// whole evaluation.
    pub exceptions: String,
}

/// Recomputes every input element at `precision_bits` under `round_mode` and
/// reports the maximum absolute and relative error of the benchmarked
/// results, along with MPFR's own exception summary.
#[cfg(feature = "mpfr")]
pub fn evaluate(
    op: Operation,
    input: &InputBuffer,
    result: &ResultBuffer,
    round_mode: RoundMode,
    precision_bits: u32,
) -> Result<ErrorMetrics> {
    use crate::buffer::Elements;
    use crate::error::invalid_argument;

    crate::ops::check_shapes(op, input, result)?;
    if precision_bits == 0 {
        return Err(invalid_argument("error precision must be positive"));
    }

    let rnd = round_mode.to_mpfr();

    // The MPFR flag word accumulates across the whole element loop; clear it
    // once up front and sample it once at the end.
    unsafe { gmp_mpfr_sys::mpfr::clear_flags() };

    let (max_abs_error, max_rel_error) = match (input.elements(), result.elements()) {
        (Elements::F32(x), Elements::F32(y)) => eval_pairs(
            x.iter().map(|&v| v as f64),
            y.iter().map(|&v| v as f64),
            op,
            rnd,
            precision_bits,
        ),
        (Elements::F64(x), Elements::F64(y)) => {
            eval_pairs(x.iter().copied(), y.iter().copied(), op, rnd, precision_bits)
        }
        // Width agreement was checked above.
        _ => unreachable!(),
    };

    let flags = unsafe { gmp_mpfr_sys::mpfr::flags_save() } as u32;
    Ok(ErrorMetrics {
        max_abs_error,
        max_rel_error,
        exceptions: mpfr_exception_label(flags),
    })
}

/// Without the `mpfr` feature, error evaluation is a capability that is
/// simply absent.
#[cfg(not(feature = "mpfr"))]
pub fn evaluate(
    _op: Operation,
    _input: &InputBuffer,
    _result: &ResultBuffer,
    _round_mode: RoundMode,
    _precision_bits: u32,
) -> Result<ErrorMetrics> {
    Err(crate::error::Error::Unsupported)
}

/// Core comparison loop over `(input, measured)` pairs.
///
/// `f32` inputs arrive widened to `f64`; the conversion is exact, so
/// rounding the widened value to `precision_bits` is identical to rounding
/// the `f32` value directly.
#[cfg(feature = "mpfr")]
fn eval_pairs(
    xs: impl Iterator<Item = f64>,
    ys: impl Iterator<Item = f64>,
    op: Operation,
    rnd: rug::float::Round,
    prec: u32,
) -> (f64, f64) {
    use rug::ops::{AssignRound, DivFromRound, SubAssignRound};
    use rug::Float;

    let mut max_abs = Float::new(prec);
    let mut max_rel = Float::new(prec);
    let mut x = Float::new(prec);
    let mut y = Float::new(prec);
    let mut z = Float::new(prec);

    for (xv, yv) in xs.zip(ys) {
        let _ = x.assign_round(xv, rnd);
        let _ = y.assign_round(yv, rnd);
        mpfr_apply(op, &mut x, rnd);
        let _ = z.assign_round(&x, rnd);
        let _ = x.sub_assign_round(&y, rnd);
        x.abs_mut();
        if x > max_abs {
            let _ = max_abs.assign_round(&x, rnd);
        }
        z.abs_mut();
        let _ = z.div_from_round(&x, rnd);
        if z > max_rel {
            let _ = max_rel.assign_round(&z, rnd);
        }
    }

    (max_abs.to_f64_round(rnd), max_rel.to_f64_round(rnd))
}

/// Applies the arbitrary-precision equivalent of `op` in place.
///
/// `lgamma` uses MPFR's signed log-gamma; the sign output is computed by the
/// library but only the log-magnitude enters the error comparison.
#[cfg(feature = "mpfr")]
fn mpfr_apply(op: Operation, v: &mut rug::Float, rnd: rug::float::Round) {
    use crate::ops::Family;

    match op.family() {
        Family::Cos => {
            let _ = v.cos_round(rnd);
        }
        Family::Sin => {
            let _ = v.sin_round(rnd);
        }
        Family::Tan => {
            let _ = v.tan_round(rnd);
        }
        Family::Acos => {
            let _ = v.acos_round(rnd);
        }
        Family::Asin => {
            let _ = v.asin_round(rnd);
        }
        Family::Atan => {
            let _ = v.atan_round(rnd);
        }
        Family::Cosh => {
            let _ = v.cosh_round(rnd);
        }
        Family::Sinh => {
            let _ = v.sinh_round(rnd);
        }
        Family::Tanh => {
            let _ = v.tanh_round(rnd);
        }
        Family::Acosh => {
            let _ = v.acosh_round(rnd);
        }
        Family::Asinh => {
            let _ = v.asinh_round(rnd);
        }
        Family::Atanh => {
            let _ = v.atanh_round(rnd);
        }
        Family::Exp => {
            let _ = v.exp_round(rnd);
        }
        Family::Log => {
            let _ = v.ln_round(rnd);
        }
        Family::Log10 => {
            let _ = v.log10_round(rnd);
        }
        Family::Exp2 => {
            let _ = v.exp2_round(rnd);
        }
        Family::Exp10 => {
            let _ = v.exp10_round(rnd);
        }
        Family::Expm1 => {
            let _ = v.exp_m1_round(rnd);
        }
        Family::Log1p => {
            let _ = v.ln_1p_round(rnd);
        }
        Family::Log2 => {
            let _ = v.log2_round(rnd);
        }
        Family::Sqrt => {
            let _ = v.sqrt_round(rnd);
        }
        Family::Cbrt => {
            let _ = v.cbrt_round(rnd);
        }
        Family::Erf => {
            let _ = v.erf_round(rnd);
        }
        Family::Erfc => {
            let _ = v.erfc_round(rnd);
        }
        Family::Tgamma => {
            let _ = v.gamma_round(rnd);
        }
        Family::Lgamma => {
            let _sign = v.ln_abs_gamma_round(rnd);
        }
    }
}

/// Canonical label for an MPFR flag word.
///
/// Same priority-first classification as the hardware-side labels, over the
/// MPFR flag vocabulary (which adds "range"), with the identical precedence
/// behavior.
#[cfg(feature = "mpfr")]
pub fn mpfr_exception_label(flags: u32) -> String {
    crate::fexcept::classify(flags, &MPFR_FLAGS).unwrap_or_else(|| "none".to_string())
}

// MPFR flag word layout, from mpfr.h.
#[cfg(feature = "mpfr")]
const MPFR_FLAGS_UNDERFLOW: u32 = 1 << 0;
#[cfg(feature = "mpfr")]
const MPFR_FLAGS_OVERFLOW: u32 = 1 << 1;
#[cfg(feature = "mpfr")]
const MPFR_FLAGS_NAN: u32 = 1 << 2;
#[cfg(feature = "mpfr")]
const MPFR_FLAGS_INEXACT: u32 = 1 << 3;
#[cfg(feature = "mpfr")]
const MPFR_FLAGS_ERANGE: u32 = 1 << 4;
#[cfg(feature = "mpfr")]
const MPFR_FLAGS_DIVBY0: u32 = 1 << 5;

/// Canonical flag order for classification; MPFR's NaN flag is reported
/// with the hardware vocabulary's "invalid" label.
#[cfg(feature = "mpfr")]
const MPFR_FLAGS: [(u32, &str); 6] = [
    (MPFR_FLAGS_DIVBY0, "divide-by-zero"),
    (MPFR_FLAGS_INEXACT, "inexact"),
    (MPFR_FLAGS_NAN, "invalid"),
    (MPFR_FLAGS_OVERFLOW, "overflow"),
    (MPFR_FLAGS_UNDERFLOW, "underflow"),
    (MPFR_FLAGS_ERANGE, "range"),
];
