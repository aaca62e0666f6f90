//! The timed repeat-until-threshold benchmark loop.
//!
//! One fork-join over the rayon pool per run. The element range is split
//! into one disjoint chunk per team member, and every member executes the
//! same repeat-until-threshold loop over its own chunk. Putting the
//! repetition counting and the elementwise partitioning in a single parallel
//! scope makes the "all members are at the same logical iteration" invariant
//! structural: members never share writable elements, and each one performs
//! exactly the same number of repetitions because the loop condition depends
//! only on run-wide constants.
//!
//! Counters are logical, team-wide values (every member adds the *full*
//! buffer length per repetition), so joining uses maximum-value reduction
//! rather than summation; equal per-member values are expected and "max"
//! only guards against divergence. Exception flags are per-thread hardware
//! state, so each member clears its own flags on entry, captures them on
//! exit, and the captures are OR-joined across the team.

use std::time::Instant;

use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::{ParallelSlice, ParallelSliceMut};

use crate::buffer::{Elements, InputBuffer, ResultBuffer};
use crate::error::{invalid_argument, Result};
use crate::fexcept::{Fexcept, FE_ALL_EXCEPT, FE_INEXACT};
use crate::ops::{check_shapes, Operation};

/// Timing and operation-count outcome of a benchmark run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchReport {
    /// Wall-clock duration of the whole loop, in seconds.
    pub seconds: f64,
    /// Repetitions of the full-buffer transform that were performed.
    pub repetitions: u64,
    /// Total elementary operations: repetitions times the buffer length.
    pub num_ops: u64,
}

/// Runs `op` over `input` into `result` until at least `repeat` repetitions
/// *and* at least `min_ops` elementary operations have been performed.
///
/// Every repetition re-processes the entire input buffer and overwrites the
/// result buffer in place (idempotent overwrite, not accumulation). On
/// completion the sticky exception flags accumulated across the team are
/// stored into `result.fexcept` with "inexact" masked out; inexact is
/// expected for nearly every transcendental function and would otherwise
/// dominate every report.
///
/// `repeat` must be at least 1. A shape or type mismatch fails before any
/// element is written.
pub fn run(
    op: Operation,
    input: &InputBuffer,
    result: &mut ResultBuffer,
    repeat: u64,
    min_ops: u64,
) -> Result<BenchReport> {
    if repeat < 1 {
        return Err(invalid_argument("repeat count must be at least 1"));
    }
    check_shapes(op, input, result)?;

    // An empty buffer contributes no operations, so the min-ops threshold
    // could never be reached; the repetitions are trivially "performed".
    if input.is_empty() {
        result.fexcept = Fexcept::clear();
        return Ok(BenchReport {
            seconds: 0.0,
            repetitions: repeat,
            num_ops: 0,
        });
    }

    let timer = Instant::now();
    let (repetitions, num_ops, flags) = match (input.elements(), result.elements_mut()) {
        (Elements::F32(x), Elements::F32(y)) => {
            team_loop(x, y, op.family().kernel_f32(), repeat, min_ops)
        }
        (Elements::F64(x), Elements::F64(y)) => {
            team_loop(x, y, op.family().kernel_f64(), repeat, min_ops)
        }
        // Width agreement was checked above.
        _ => unreachable!(),
    };
    let seconds = timer.elapsed().as_secs_f64();

    result.fexcept = Fexcept::from_bits(flags & (FE_ALL_EXCEPT & !FE_INEXACT));
    Ok(BenchReport {
        seconds,
        repetitions,
        num_ops,
    })
}

/// The per-member loop: clear local flags, repeat the chunk transform until
/// both thresholds are met, capture local flags. Joined with max-reduction
/// on the counters and OR on the flag words.
fn team_loop<T: num::Float + Send + Sync>(
    x: &[T],
    y: &mut [T],
    kernel: fn(T) -> T,
    repeat: u64,
    min_ops: u64,
) -> (u64, u64, u32) {
    let total = x.len() as u64;
    let chunk = x.len().div_ceil(rayon::current_num_threads().max(1));

    y.par_chunks_mut(chunk)
        .zip(x.par_chunks(chunk))
        .map(|(y_chunk, x_chunk)| {
            Fexcept::clear();
            let mut repetitions = 0u64;
            let mut num_ops = 0u64;
            while repetitions < repeat || num_ops < min_ops {
                for (yi, xi) in y_chunk.iter_mut().zip(x_chunk.iter()) {
                    *yi = kernel(*xi);
                }
                repetitions += 1;
                num_ops += total;
            }
            (repetitions, num_ops, Fexcept::store(FE_ALL_EXCEPT).bits())
        })
        .reduce(
            || (0, 0, 0),
            |a, b| (a.0.max(b.0), a.1.max(b.1), a.2 | b.2),
        )
}
