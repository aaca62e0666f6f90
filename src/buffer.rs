//! Typed, aligned input and result buffers.
//!
//! An [`InputBuffer`] is read-only to the core once built. A
//! [`ResultBuffer`] is created to match an operation's output type and an
//! input's length, overwritten in place on every benchmark repetition, and
//! carries the exception flag snapshot taken when the benchmark loop
//! finishes.

use crate::alloc::alloc_zeroed_vec;
use crate::error::Result;
use crate::fexcept::Fexcept;
use crate::ops::{Operation, Width};

/// Typed element storage shared by both buffer kinds.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Elements {
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Elements {
    fn width(&self) -> Width {
        match self {
            Elements::F32(_) => Width::Narrow,
            Elements::F64(_) => Width::Wide,
        }
    }

    fn len(&self) -> usize {
        match self {
            Elements::F32(v) => v.len(),
            Elements::F64(v) => v.len(),
        }
    }
}

/// A read-only buffer of benchmark input values.
#[derive(Debug, Clone, PartialEq)]
pub struct InputBuffer {
    elems: Elements,
}

impl InputBuffer {
    /// Builds a narrow input buffer, copying `values` into storage aligned
    /// to `align` bytes.
    pub fn from_f32s(values: &[f32], align: usize) -> Result<Self> {
        let mut v = alloc_zeroed_vec::<f32>(values.len(), align)?;
        v.copy_from_slice(values);
        Ok(Self {
            elems: Elements::F32(v),
        })
    }

    /// Builds a wide input buffer, copying `values` into storage aligned to
    /// `align` bytes.
    pub fn from_f64s(values: &[f64], align: usize) -> Result<Self> {
        let mut v = alloc_zeroed_vec::<f64>(values.len(), align)?;
        v.copy_from_slice(values);
        Ok(Self {
            elems: Elements::F64(v),
        })
    }

    /// The element width of this buffer.
    pub fn width(&self) -> Width {
        self.elems.width()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The elements as an `f32` slice, when narrow.
    pub fn as_f32s(&self) -> Option<&[f32]> {
        match &self.elems {
            Elements::F32(v) => Some(v),
            Elements::F64(_) => None,
        }
    }

    /// The elements as an `f64` slice, when wide.
    pub fn as_f64s(&self) -> Option<&[f64]> {
        match &self.elems {
            Elements::F64(v) => Some(v),
            Elements::F32(_) => None,
        }
    }

    pub(crate) fn elements(&self) -> &Elements {
        &self.elems
    }
}

/// A buffer receiving benchmark results, plus the hardware exception flags
/// captured after the benchmark loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBuffer {
    elems: Elements,
    /// Sticky hardware exception flags accumulated over the last benchmark
    /// run into this buffer, with "inexact" masked out.
    pub fexcept: Fexcept,
}

impl ResultBuffer {
    /// Allocates a zero-filled result buffer matching `op`'s output type,
    /// with `len` elements aligned to `align` bytes.
    pub fn for_operation(op: Operation, len: usize, align: usize) -> Result<Self> {
        let elems = match op.width() {
            Width::Narrow => Elements::F32(alloc_zeroed_vec::<f32>(len, align)?),
            Width::Wide => Elements::F64(alloc_zeroed_vec::<f64>(len, align)?),
        };
        Ok(Self {
            elems,
            fexcept: Fexcept::default(),
        })
    }

    /// The element width of this buffer.
    pub fn width(&self) -> Width {
        self.elems.width()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The elements as an `f32` slice, when narrow.
    pub fn as_f32s(&self) -> Option<&[f32]> {
        match &self.elems {
            Elements::F32(v) => Some(v),
            Elements::F64(_) => None,
        }
    }

    /// The elements as an `f64` slice, when wide.
    pub fn as_f64s(&self) -> Option<&[f64]> {
        match &self.elems {
            Elements::F64(v) => Some(v),
            Elements::F32(_) => None,
        }
    }

    pub(crate) fn elements(&self) -> &Elements {
        &self.elems
    }

    pub(crate) fn elements_mut(&mut self) -> &mut Elements {
        &mut self.elems
    }
}
