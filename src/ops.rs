//! The operation catalog.
//!
//! Maps operation names to elementwise transforms over typed buffers. The
//! catalog is the cross product of 26 mathematical families and two element
//! widths: the double-precision operation carries the family name (`cos`,
//! `erf`, ...) and the single-precision operation carries the `f` suffix
//! (`cosf`, `erff`, ...), following the C math library naming convention.
//!
//! Scalar kernels come from `std` where the standard library provides them
//! and from the `libm` crate for the C99 functions it does not (the error,
//! gamma, and base-10 exponential functions). This crate deliberately
//! implements none of them itself.

use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::{ParallelSlice, ParallelSliceMut};

use crate::buffer::{Elements, InputBuffer, ResultBuffer};
use crate::error::{invalid_argument, Result};

/// A mathematical function family, independent of element width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    // Trigonometric functions
    Cos,
    Sin,
    Tan,
    Acos,
    Asin,
    Atan,
    // Hyperbolic functions
    Cosh,
    Sinh,
    Tanh,
    Acosh,
    Asinh,
    Atanh,
    // Exponential and logarithmic functions
    Exp,
    Log,
    Log10,
    Exp2,
    Exp10,
    Expm1,
    Log1p,
    Log2,
    // Power functions
    Sqrt,
    Cbrt,
    // Error and gamma functions
    Erf,
    Erfc,
    Tgamma,
    Lgamma,
}

/// All function families, in catalog order.
pub const FAMILIES: [Family; 26] = [
    Family::Cos,
    Family::Sin,
    Family::Tan,
    Family::Acos,
    Family::Asin,
    Family::Atan,
    Family::Cosh,
    Family::Sinh,
    Family::Tanh,
    Family::Acosh,
    Family::Asinh,
    Family::Atanh,
    Family::Exp,
    Family::Log,
    Family::Log10,
    Family::Exp2,
    Family::Exp10,
    Family::Expm1,
    Family::Log1p,
    Family::Log2,
    Family::Sqrt,
    Family::Cbrt,
    Family::Erf,
    Family::Erfc,
    Family::Tgamma,
    Family::Lgamma,
];

impl Family {
    /// The family name, which doubles as the wide operation's name.
    pub fn name(self) -> &'static str {
        match self {
            Family::Cos => "cos",
            Family::Sin => "sin",
            Family::Tan => "tan",
            Family::Acos => "acos",
            Family::Asin => "asin",
            Family::Atan => "atan",
            Family::Cosh => "cosh",
            Family::Sinh => "sinh",
            Family::Tanh => "tanh",
            Family::Acosh => "acosh",
            Family::Asinh => "asinh",
            Family::Atanh => "atanh",
            Family::Exp => "exp",
            Family::Log => "log",
            Family::Log10 => "log10",
            Family::Exp2 => "exp2",
            Family::Exp10 => "exp10",
            Family::Expm1 => "expm1",
            Family::Log1p => "log1p",
            Family::Log2 => "log2",
            Family::Sqrt => "sqrt",
            Family::Cbrt => "cbrt",
            Family::Erf => "erf",
            Family::Erfc => "erfc",
            Family::Tgamma => "tgamma",
            Family::Lgamma => "lgamma",
        }
    }

    /// The narrow operation's name (`f` suffix).
    pub fn narrow_name(self) -> &'static str {
        match self {
            Family::Cos => "cosf",
            Family::Sin => "sinf",
            Family::Tan => "tanf",
            Family::Acos => "acosf",
            Family::Asin => "asinf",
            Family::Atan => "atanf",
            Family::Cosh => "coshf",
            Family::Sinh => "sinhf",
            Family::Tanh => "tanhf",
            Family::Acosh => "acoshf",
            Family::Asinh => "asinhf",
            Family::Atanh => "atanhf",
            Family::Exp => "expf",
            Family::Log => "logf",
            Family::Log10 => "log10f",
            Family::Exp2 => "exp2f",
            Family::Exp10 => "exp10f",
            Family::Expm1 => "expm1f",
            Family::Log1p => "log1pf",
            Family::Log2 => "log2f",
            Family::Sqrt => "sqrtf",
            Family::Cbrt => "cbrtf",
            Family::Erf => "erff",
            Family::Erfc => "erfcf",
            Family::Tgamma => "tgammaf",
            Family::Lgamma => "lgammaf",
        }
    }

    /// The double-precision scalar kernel.
    pub fn kernel_f64(self) -> fn(f64) -> f64 {
        match self {
            Family::Cos => f64::cos,
            Family::Sin => f64::sin,
            Family::Tan => f64::tan,
            Family::Acos => f64::acos,
            Family::Asin => f64::asin,
            Family::Atan => f64::atan,
            Family::Cosh => f64::cosh,
            Family::Sinh => f64::sinh,
            Family::Tanh => f64::tanh,
            Family::Acosh => f64::acosh,
            Family::Asinh => f64::asinh,
            Family::Atanh => f64::atanh,
            Family::Exp => f64::exp,
            Family::Log => f64::ln,
            Family::Log10 => f64::log10,
            Family::Exp2 => f64::exp2,
            Family::Exp10 => libm::exp10,
            Family::Expm1 => f64::exp_m1,
            Family::Log1p => f64::ln_1p,
            Family::Log2 => f64::log2,
            Family::Sqrt => f64::sqrt,
            Family::Cbrt => f64::cbrt,
            Family::Erf => libm::erf,
            Family::Erfc => libm::erfc,
            Family::Tgamma => libm::tgamma,
            Family::Lgamma => libm::lgamma,
        }
    }

    /// The single-precision scalar kernel.
    pub fn kernel_f32(self) -> fn(f32) -> f32 {
        match self {
            Family::Cos => f32::cos,
            Family::Sin => f32::sin,
            Family::Tan => f32::tan,
            Family::Acos => f32::acos,
            Family::Asin => f32::asin,
            Family::Atan => f32::atan,
            Family::Cosh => f32::cosh,
            Family::Sinh => f32::sinh,
            Family::Tanh => f32::tanh,
            Family::Acosh => f32::acosh,
            Family::Asinh => f32::asinh,
            Family::Atanh => f32::atanh,
            Family::Exp => f32::exp,
            Family::Log => f32::ln,
            Family::Log10 => f32::log10,
            Family::Exp2 => f32::exp2,
            Family::Exp10 => libm::exp10f,
            Family::Expm1 => f32::exp_m1,
            Family::Log1p => f32::ln_1p,
            Family::Log2 => f32::log2,
            Family::Sqrt => f32::sqrt,
            Family::Cbrt => f32::cbrt,
            Family::Erf => libm::erff,
            Family::Erfc => libm::erfcf,
            Family::Tgamma => libm::tgammaf,
            Family::Lgamma => libm::lgammaf,
        }
    }
}

/// Element width of an operation's input and output type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// 4-byte single precision (`f32`).
    Narrow,
    /// 8-byte double precision (`f64`).
    Wide,
}

/// A catalog entry: one named function bound to an element width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operation {
    family: Family,
    width: Width,
}

impl Operation {
    /// Looks up an operation by name.
    ///
    /// Unknown names fail with an invalid-argument error.
    pub fn resolve(name: &str) -> Result<Operation> {
        for family in FAMILIES {
            if name == family.name() {
                return Ok(Operation {
                    family,
                    width: Width::Wide,
                });
            }
            if name == family.narrow_name() {
                return Ok(Operation {
                    family,
                    width: Width::Narrow,
                });
            }
        }
        Err(invalid_argument(format!("unknown operation `{}`", name)))
    }

    /// The operation's name, round-tripping with [`Operation::resolve`].
    pub fn name(&self) -> &'static str {
        match self.width {
            Width::Wide => self.family.name(),
            Width::Narrow => self.family.narrow_name(),
        }
    }

    /// The function family this operation belongs to.
    pub fn family(&self) -> Family {
        self.family
    }

    /// The element width of this operation's input and output.
    pub fn width(&self) -> Width {
        self.width
    }

    /// Every operation in the catalog, in catalog order.
    pub fn all() -> impl Iterator<Item = Operation> {
        FAMILIES.into_iter().flat_map(|family| {
            [
                Operation {
                    family,
                    width: Width::Wide,
                },
                Operation {
                    family,
                    width: Width::Narrow,
                },
            ]
        })
    }
}

/// Validates that `input` and `result` match `op`'s element width and each
/// other's length. Nothing is written on failure.
pub(crate) fn check_shapes(
    op: Operation,
    input: &InputBuffer,
    result: &ResultBuffer,
) -> Result<()> {
    if input.width() != op.width() {
        return Err(invalid_argument(format!(
            "operation `{}` expects {} input elements, got {}",
            op.name(),
            width_str(op.width()),
            width_str(input.width()),
        )));
    }
    if result.width() != op.width() {
        return Err(invalid_argument(format!(
            "operation `{}` expects {} result elements, got {}",
            op.name(),
            width_str(op.width()),
            width_str(result.width()),
        )));
    }
    if input.len() != result.len() {
        return Err(invalid_argument(format!(
            "input has {} elements but result has {}",
            input.len(),
            result.len(),
        )));
    }
    Ok(())
}

fn width_str(width: Width) -> &'static str {
    match width {
        Width::Narrow => "f32",
        Width::Wide => "f64",
    }
}

/// Applies `op` elementwise, overwriting every element of `result` from the
/// corresponding element of `input`.
///
/// The element range is partitioned into disjoint chunks across the rayon
/// pool; there is no cross-element dependency, so no synchronization beyond
/// the join. Returns the number of elements processed, which is the
/// elementary-operation count for throughput accounting.
pub fn apply(op: Operation, input: &InputBuffer, result: &mut ResultBuffer) -> Result<u64> {
    check_shapes(op, input, result)?;
    match (input.elements(), result.elements_mut()) {
        (Elements::F32(x), Elements::F32(y)) => map_slice(x, y, op.family().kernel_f32()),
        (Elements::F64(x), Elements::F64(y)) => map_slice(x, y, op.family().kernel_f64()),
        // Width agreement was checked above.
        _ => unreachable!(),
    }
    Ok(input.len() as u64)
}

/// Elementwise map over disjoint per-worker chunks.
pub(crate) fn map_slice<T: num::Float + Send + Sync>(x: &[T], y: &mut [T], kernel: fn(T) -> T) {
    if x.is_empty() {
        return;
    }
    let chunk = x.len().div_ceil(rayon::current_num_threads().max(1));
    y.par_chunks_mut(chunk)
        .zip(x.par_chunks(chunk))
        .for_each(|(y_chunk, x_chunk)| {
            for (yi, xi) in y_chunk.iter_mut().zip(x_chunk.iter()) {
                *yi = kernel(*xi);
            }
        });
}
