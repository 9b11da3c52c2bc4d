//! Cache-line aligned heap buffer with allocation tracking.

use crate::error::{MatmulError, Result};
use std::alloc::{Layout, alloc_zeroed, dealloc, handle_alloc_error};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Alignment of every [`AlignedBuffer`] allocation (one cache line).
pub const ALIGNMENT_BYTES: usize = 64;

/// Snapshot of an [`AllocTracker`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackedAllocStats {
    pub current_bytes: usize,
    pub peak_bytes: usize,
}

/// Current/peak byte counters fed by [`AlignedBuffer`].
///
/// Relaxed atomics: concurrent updates from unrelated buffers are safe, but
/// the peak is only approximate under races. Diagnostics only.
#[derive(Debug, Default)]
pub struct AllocTracker {
    current: AtomicUsize,
    peak: AtomicUsize,
}

static GLOBAL_TRACKER: AllocTracker = AllocTracker::new();

impl AllocTracker {
    pub const fn new() -> Self {
        Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// The process-wide tracker used by buffers that were not given one.
    pub fn global() -> &'static AllocTracker {
        &GLOBAL_TRACKER
    }

    pub fn record_alloc(&self, bytes: usize) {
        let current = self.current.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.peak.fetch_max(current, Ordering::Relaxed);
    }

    pub fn record_release(&self, bytes: usize) {
        self.current.fetch_sub(bytes, Ordering::Relaxed);
    }

    pub fn stats(&self) -> TrackedAllocStats {
        TrackedAllocStats {
            current_bytes: self.current.load(Ordering::Relaxed),
            peak_bytes: self.peak.load(Ordering::Relaxed),
        }
    }
}

/// Stats of the process-wide tracker.
pub fn tracked_alloc_stats() -> TrackedAllocStats {
    GLOBAL_TRACKER.stats()
}

/// A zero-initialised heap block aligned to [`ALIGNMENT_BYTES`].
///
/// Move-only. Dropping the buffer releases the block.
pub struct AlignedBuffer {
    ptr: Option<NonNull<u8>>,
    bytes: usize,
    tracker: &'static AllocTracker,
}

// Safety: AlignedBuffer owns its block exclusively and hands out borrows only
// through `&self` / `&mut self`.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// An empty buffer reporting to the global tracker.
    pub fn new() -> Self {
        Self::new_in(AllocTracker::global())
    }

    /// An empty buffer reporting to `tracker`.
    pub fn new_in(tracker: &'static AllocTracker) -> Self {
        Self {
            ptr: None,
            bytes: 0,
            tracker,
        }
    }

    pub fn with_bytes(bytes: usize) -> Result<Self> {
        let mut buf = Self::new();
        buf.allocate(bytes)?;
        Ok(buf)
    }

    /// Releases any previous block, then allocates `bytes` zeroed bytes.
    ///
    /// Zero bytes leaves the buffer empty.
    pub fn allocate(&mut self, bytes: usize) -> Result<()> {
        self.release();
        if bytes == 0 {
            return Ok(());
        }

        let layout = Self::layout(bytes)?;
        // SAFETY: layout has non-zero size
        let raw = unsafe { alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            handle_alloc_error(layout);
        };

        self.ptr = Some(ptr);
        self.bytes = bytes;
        self.tracker.record_alloc(bytes);
        Ok(())
    }

    /// Frees the block. Safe to call on an empty buffer.
    pub fn release(&mut self) {
        let Some(ptr) = self.ptr.take() else {
            return;
        };
        self.tracker.record_release(self.bytes);
        // SAFETY: ptr was produced by alloc_zeroed with exactly this layout
        unsafe {
            dealloc(
                ptr.as_ptr(),
                Layout::from_size_align_unchecked(self.bytes, ALIGNMENT_BYTES),
            );
        }
        self.bytes = 0;
    }

    /// Size of the current block in bytes (0 when empty).
    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.bytes
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self.ptr {
            // SAFETY: the block is `bytes` long, initialised, and owned by self
            Some(ptr) => unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.bytes) },
            None => &[],
        }
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        match self.ptr {
            // SAFETY: as above, and `&mut self` guarantees exclusivity
            Some(ptr) => unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), self.bytes) },
            None => &mut [],
        }
    }

    fn layout(bytes: usize) -> Result<Layout> {
        Layout::from_size_align(bytes, ALIGNMENT_BYTES)
            .map_err(|_| MatmulError::SizeOverflow("aligned buffer layout"))
    }
}

impl Default for AlignedBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("bytes", &self.bytes)
            .finish()
    }
}
