//! Padding and scratch-sizing policy.

use crate::error::{MatmulError, Result};
use crate::memory::arena::scratch_alignment;

/// Fixed slack added on top of the per-level alignment allowance.
const SCRATCH_SAFETY_MARGIN_BYTES: u128 = 1024;

/// Scratch matrices allocated per recursion level (M1..M7, T1, T2).
const ALLOCATIONS_PER_LEVEL: u128 = 9;

/// `false` for zero.
#[inline]
pub fn is_power_of_two(n: usize) -> bool {
    n.is_power_of_two()
}

/// Smallest power of two `>= n`; 1 for `n == 0`.
pub fn next_power_of_two(n: usize) -> Result<usize> {
    n.checked_next_power_of_two()
        .ok_or(MatmulError::SizeOverflow("next power of two"))
}

/// Arena bytes sufficient for a Strassen multiply of power-of-two size `n`.
///
/// The live scratch at any point is one set of nine quadrant-sized matrices
/// per active recursion level: `9·(n/2)²·(1 + 1/4 + 1/16 + …) < 3·n²`
/// elements. Each level may also lose up to one alignment unit per
/// allocation, and a fixed margin is added on top. The margin is a heuristic
/// upper bound rather than a tight one.
pub fn strassen_scratch_bytes<T>(n: usize) -> Result<usize> {
    if n == 0 {
        return Ok(0);
    }
    let overflow = || MatmulError::SizeOverflow("strassen scratch size");

    let nn = (n as u128).checked_mul(n as u128).ok_or_else(overflow)?;
    let data = nn
        .checked_mul(3 * size_of::<T>() as u128)
        .ok_or_else(overflow)?;

    let levels = u128::from(n.ilog2());
    let overhead =
        ALLOCATIONS_PER_LEVEL * levels * scratch_alignment::<T>() as u128 + SCRATCH_SAFETY_MARGIN_BYTES;

    let total = data.checked_add(overhead).ok_or_else(overflow)?;
    usize::try_from(total).map_err(|_| overflow())
}
