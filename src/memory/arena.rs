//! Bump-allocated scratch space for temporary matrices.
//!
//! [`ScratchArena`] owns one pre-sized [`AlignedBuffer`] and a byte cursor.
//! Scratch matrices are carved off the cursor and reclaimed in bulk by rolling
//! the cursor back to an earlier [`ArenaMark`]; there is no per-allocation
//! free.
//!
//! Holding several scratch matrices at once goes through a [`ScratchFrame`]:
//! a borrow of the arena's free tail. Everything allocated from a frame lives
//! until the frame is dropped, and dropping it rolls the cursor back to where
//! the frame was opened. Child frames borrow their parent, so frames nest in
//! strict LIFO order.
//!
//! ```
//! use matmul::memory::arena::ScratchArena;
//!
//! let mut arena = ScratchArena::<f64>::with_capacity(1024).unwrap();
//! {
//!     let mut frame = arena.frame();
//!     let mut t1 = frame.alloc_matrix(2, 2).unwrap();
//!     let t2 = frame.alloc_matrix(2, 2).unwrap();
//!     t1[(0, 0)] = 1.0;
//!     assert_eq!(t2.rows(), 2);
//! }
//! assert_eq!(arena.used_bytes(), 0);
//! assert_eq!(arena.peak_bytes(), 64);
//! ```

use super::aligned::AlignedBuffer;
use crate::error::{MatmulError, Result};
use crate::matrix::view::MatrixViewMut;
use crate::scalar::Scalar;
use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimum alignment of each scratch matrix. Allocations use the larger of
/// this and `align_of::<T>()`.
pub const SCRATCH_ALIGNMENT_BYTES: usize = 16;

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

#[inline]
pub fn scratch_alignment<T>() -> usize {
    SCRATCH_ALIGNMENT_BYTES.max(align_of::<T>())
}

/// Checkpoint of an arena's cursor, usable with [`ScratchArena::rollback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaMark {
    arena: u64,
    offset: usize,
}

impl ArenaMark {
    /// Byte offset captured by this mark.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Where a `rows x cols` block starting at or after `start` would land:
/// `(aligned_start, bytes)`.
fn place<T>(start: usize, capacity: usize, rows: usize, cols: usize) -> Result<(usize, usize)> {
    let bytes = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(size_of::<T>()))
        .ok_or(MatmulError::SizeOverflow("scratch matrix size"))?;
    let aligned = start
        .checked_next_multiple_of(scratch_alignment::<T>())
        .ok_or(MatmulError::SizeOverflow("scratch alignment"))?;
    match aligned.checked_add(bytes) {
        Some(end) if end <= capacity => Ok((aligned, bytes)),
        _ => Err(MatmulError::CapacityExceeded {
            requested: bytes,
            offset: aligned,
            capacity,
        }),
    }
}

fn typed_block<T: Scalar>(block: &mut [u8], rows: usize, cols: usize) -> Result<MatrixViewMut<'_, T>> {
    let data: &mut [T] = bytemuck::try_cast_slice_mut(block)
        .map_err(|e| MatmulError::InvalidArgument(format!("scratch block cast: {e}")))?;
    Ok(MatrixViewMut::contiguous(data, rows, cols))
}

/// Bump allocator over a single pre-sized aligned buffer.
///
/// Not `Sync`: one arena serves one multiplication call tree at a time.
pub struct ScratchArena<T> {
    id: u64,
    buf: AlignedBuffer,
    offset: Cell<usize>,
    peak: Cell<usize>,
    _marker: PhantomData<T>,
}

impl<T: Scalar> ScratchArena<T> {
    /// An arena with no capacity.
    pub fn new() -> Self {
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            buf: AlignedBuffer::new(),
            offset: Cell::new(0),
            peak: Cell::new(0),
            _marker: PhantomData,
        }
    }

    pub fn with_capacity(capacity_bytes: usize) -> Result<Self> {
        let mut arena = Self::new();
        arena.reset_capacity(capacity_bytes)?;
        Ok(arena)
    }

    /// Replaces the backing buffer with a fresh one of `capacity_bytes` and
    /// resets the cursor and peak. Marks issued before stay tied to this
    /// arena but no longer describe live scratch.
    pub fn reset_capacity(&mut self, capacity_bytes: usize) -> Result<()> {
        self.buf.allocate(capacity_bytes)?;
        self.offset.set(0);
        self.peak.set(0);
        tracing::debug!(capacity_bytes, "scratch arena sized");
        Ok(())
    }

    #[inline]
    pub fn capacity_bytes(&self) -> usize {
        self.buf.len_bytes()
    }

    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.offset.get()
    }

    #[inline]
    pub fn free_bytes(&self) -> usize {
        self.capacity_bytes() - self.used_bytes()
    }

    /// Highest cursor position reached since creation or the last
    /// [`reset_peak`](Self::reset_peak).
    #[inline]
    pub fn peak_bytes(&self) -> usize {
        self.peak.get()
    }

    pub fn reset_peak(&mut self) {
        self.peak.set(self.offset.get());
    }

    pub fn mark(&self) -> ArenaMark {
        ArenaMark {
            arena: self.id,
            offset: self.offset.get(),
        }
    }

    /// Moves the cursor back to `mark`, discarding everything allocated
    /// after it.
    ///
    /// # Errors
    ///
    /// `ForeignMark` if `mark` came from another arena, `MarkOutOfRange` if
    /// it lies beyond the current cursor.
    pub fn rollback(&mut self, mark: ArenaMark) -> Result<()> {
        if mark.arena != self.id {
            return Err(MatmulError::ForeignMark);
        }
        let offset = self.offset.get();
        if mark.offset > offset {
            return Err(MatmulError::MarkOutOfRange {
                mark: mark.offset,
                offset,
            });
        }
        self.offset.set(mark.offset);
        Ok(())
    }

    /// Carves a contiguous `rows x cols` matrix off the cursor.
    ///
    /// The cursor stays advanced until a [`rollback`](Self::rollback).
    /// Zero-sized requests return an empty view and leave the cursor alone.
    pub fn alloc_matrix(&mut self, rows: usize, cols: usize) -> Result<MatrixViewMut<'_, T>> {
        if rows == 0 || cols == 0 {
            return Ok(MatrixViewMut::contiguous(&mut [], rows, cols));
        }
        let (start, bytes) = place::<T>(self.offset.get(), self.capacity_bytes(), rows, cols)?;
        let end = start + bytes;
        self.offset.set(end);
        self.peak.set(self.peak.get().max(end));
        typed_block(&mut self.buf.as_bytes_mut()[start..end], rows, cols)
    }

    /// Opens a frame over the free tail of the arena.
    pub fn frame(&mut self) -> ScratchFrame<'_, T> {
        let start = self.offset.get();
        ScratchFrame {
            free: &mut self.buf.as_bytes_mut()[start..],
            start,
            entry: start,
            cursor: &self.offset,
            peak: &self.peak,
            _marker: PhantomData,
        }
    }
}

impl<T: Scalar> Default for ScratchArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ScratchArena<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchArena")
            .field("capacity_bytes", &self.buf.len_bytes())
            .field("used_bytes", &self.offset.get())
            .field("peak_bytes", &self.peak.get())
            .finish()
    }
}

/// A LIFO scope of scratch allocations; see the [module docs](self).
pub struct ScratchFrame<'a, T> {
    free: &'a mut [u8],
    start: usize,
    entry: usize,
    cursor: &'a Cell<usize>,
    peak: &'a Cell<usize>,
    _marker: PhantomData<T>,
}

impl<'a, T: Scalar> ScratchFrame<'a, T> {
    /// Allocates a contiguous `rows x cols` matrix that lives as long as the
    /// frame's borrow of the arena.
    pub fn alloc_matrix(&mut self, rows: usize, cols: usize) -> Result<MatrixViewMut<'a, T>> {
        if rows == 0 || cols == 0 {
            return Ok(MatrixViewMut::contiguous(&mut [], rows, cols));
        }
        let capacity = self.start + self.free.len();
        let (aligned, bytes) = place::<T>(self.start, capacity, rows, cols)?;

        let free = std::mem::take(&mut self.free);
        let (_, tail) = free.split_at_mut(aligned - self.start);
        let (block, rest) = tail.split_at_mut(bytes);
        self.free = rest;
        self.start = aligned + bytes;

        self.cursor.set(self.start);
        self.peak.set(self.peak.get().max(self.start));
        typed_block(block, rows, cols)
    }

    /// Opens a nested frame after everything allocated so far. Dropping it
    /// returns the cursor to this point.
    pub fn child(&mut self) -> ScratchFrame<'_, T> {
        ScratchFrame {
            free: &mut *self.free,
            start: self.start,
            entry: self.start,
            cursor: self.cursor,
            peak: self.peak,
            _marker: PhantomData,
        }
    }

    /// Arena offset at which the frame was opened.
    #[inline]
    pub fn entry_offset(&self) -> usize {
        self.entry
    }

    /// Current arena offset.
    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.start
    }
}

impl<T> Drop for ScratchFrame<'_, T> {
    fn drop(&mut self) {
        self.cursor.set(self.entry);
    }
}
