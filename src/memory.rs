// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Device memory estimation and accounting.
//!
//! ## Why This Module Exists
//!
//! Device regions live outside host memory. There is no swap behind them, and
//! an accelerator that runs out simply fails the allocation, often with a
//! status code that says little about who asked for what. Counting bytes on
//! the host side gives two things the accelerator API does not:
//!
//! 1. **A budget**: a session can be capped below what the device offers, and
//!    the cap is hit with a readable `OutOfMemory` before the backend is asked
//! 2. **A leak check**: every region is charged when it is created and
//!    credited when it is released, so a finished session must read zero
//!
//! The session charges each region against a [`MemoryTracker`] before asking
//! the backend for it. Tests read the tracker after the session is gone to
//! show that every region was released exactly once.

use crate::buffer::Element;
use crate::error::{CombineError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Bytes needed for a device region holding `len` elements of `T`.
///
/// ```rust
/// use vector_combine::estimate_buffer_bytes;
///
/// assert_eq!(estimate_buffer_bytes::<f32>(16), 64);
/// ```
#[must_use]
pub fn estimate_buffer_bytes<T: Element>(len: usize) -> usize {
    len * T::size_in_bytes()
}

/// Bytes needed for a full session: `regions` device regions of `len` elements.
///
/// Logged when a session starts so the footprint is visible before any
/// region exists.
#[must_use]
pub fn estimate_session_bytes<T: Element>(regions: usize, len: usize) -> usize {
    regions * estimate_buffer_bytes::<T>(len)
}

/// Device memory usage tracker.
///
/// ## Why This Struct
///
/// The accelerator owns the memory, but only the host knows which region it
/// belongs to. The tracker keeps the current and peak byte counts plus an
/// optional limit in atomics, so it can be shared through an `Arc` between
/// the session and each region's release path.
///
/// ```rust
/// use vector_combine::MemoryTracker;
///
/// let tracker = MemoryTracker::with_limit(128);
/// tracker.allocate(64).expect("fits");
/// assert!(tracker.allocate(128).is_err());
/// tracker.deallocate(64);
/// assert_eq!(tracker.allocated_bytes(), 0);
/// assert_eq!(tracker.peak_bytes(), 64);
/// ```
#[derive(Debug)]
pub struct MemoryTracker {
    /// Currently allocated bytes.
    allocated: AtomicUsize,
    /// Peak allocation during lifetime.
    peak: AtomicUsize,
    /// Optional memory limit (0 = unlimited).
    limit: AtomicUsize,
}

impl Default for MemoryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTracker {
    /// Create a new memory tracker with no limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(0)
    }

    /// Create a tracker with a memory limit (0 = unlimited).
    #[must_use]
    pub fn with_limit(limit_bytes: usize) -> Self {
        Self {
            allocated: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            limit: AtomicUsize::new(limit_bytes),
        }
    }

    /// Record a device allocation.
    ///
    /// # Errors
    ///
    /// Returns `CombineError::OutOfMemory` if the allocation would exceed the
    /// limit. The tracker is unchanged in that case.
    pub fn allocate(&self, bytes: usize) -> Result<()> {
        // Limit is checked before any counter changes.
        let limit = self.limit.load(Ordering::SeqCst);
        let current = self.allocated.load(Ordering::SeqCst);
        let new_allocated = current + bytes;

        if limit > 0 && new_allocated > limit {
            return Err(CombineError::oom(format!(
                "allocation of {bytes} bytes would exceed limit of {limit} bytes \
                 (current: {current} bytes)"
            )));
        }

        let actual_new = self.allocated.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.peak.fetch_max(actual_new, Ordering::SeqCst);
        Ok(())
    }

    /// Record a device release.
    pub fn deallocate(&self, bytes: usize) {
        self.allocated.fetch_sub(bytes, Ordering::SeqCst);
    }

    /// Currently allocated bytes.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    /// High-water mark during tracker lifetime.
    #[must_use]
    pub fn peak_bytes(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

}
