//! Aligned buffer allocation.
//!
//! Input and result buffers are allocated at a caller-chosen alignment so
//! that the element loops can run over well-aligned contiguous memory.
//! Allocation failures surface as [`crate::error::Error::Allocation`] rather
//! than aborting; partially constructed buffers are released by `Vec`'s own
//! ownership.

#[cfg(not(target_os = "windows"))]
use std::alloc::{alloc_zeroed, Layout};

use crate::error::{allocation_error, Result};

/// Allocates a zero-initialized `Vec<T>` whose storage is aligned to
/// `align` bytes.
///
/// `align` must be a power of two; it is raised to `align_of::<T>()` when
/// smaller, so the returned storage is always valid for `T`.
///
/// On Windows the global allocator and `std::alloc` may disagree, so the
/// request falls back to `Vec`'s natural alignment there.
#[cfg(not(target_os = "windows"))]
pub fn alloc_zeroed_vec<T: num::Float>(len: usize, align: usize) -> Result<Vec<T>> {
    if len == 0 {
        return Ok(Vec::new());
    }

    let size = len * std::mem::size_of::<T>();
    if !align.is_power_of_two() {
        return Err(allocation_error(
            size,
            align,
            "alignment must be a power of two",
        ));
    }
    let align = align.max(std::mem::align_of::<T>());

    let layout = Layout::from_size_align(size, align)
        .map_err(|_| allocation_error(size, align, "invalid layout"))?;

    let ptr = unsafe { alloc_zeroed(layout) as *mut T };
    if ptr.is_null() {
        return Err(allocation_error(size, align, "allocator returned null"));
    }

    // SAFETY:
    // - ptr is non-null, properly aligned, and holds len zeroed elements
    // - the all-zero bit pattern is a valid value for IEEE float types
    // - on Linux/Mac, Vec uses the same allocator as std::alloc
    Ok(unsafe { Vec::from_raw_parts(ptr, len, len) })
}

#[cfg(target_os = "windows")]
pub fn alloc_zeroed_vec<T: num::Float>(len: usize, align: usize) -> Result<Vec<T>> {
    if !align.is_power_of_two() {
        return Err(allocation_error(
            len * std::mem::size_of::<T>(),
            align,
            "alignment must be a power of two",
        ));
    }
    Ok(vec![T::zero(); len])
}
