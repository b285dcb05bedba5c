//! Cursor cells and occupancy arithmetic
//!
//! Each cursor is written by exactly one side (producer owns the write
//! cursor, consumer owns the read cursor) and observed by the other.
//! Publishing a cursor is a release store; observing the *other* side's
//! cursor before touching storage is an acquire load.
//!
//! Author: Moroya Sakamoto

use core::sync::atomic::{AtomicUsize, Ordering};

/// Single-writer, single-reader index cell
pub(crate) struct Cursor(AtomicUsize);

impl Cursor {
    pub(crate) const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    /// Load the other side's cursor before accessing the bytes it guards
    #[inline]
    pub(crate) fn observe(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    /// Load without ordering (own cursor, or pure introspection)
    #[inline]
    pub(crate) fn snapshot(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Make a new position visible after the corresponding copy completed
    #[inline]
    pub(crate) fn publish(&self, pos: usize) {
        self.0.store(pos, Ordering::Release);
    }
}

impl core::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.snapshot())
    }
}

/// Bytes holding unread data
#[inline]
pub(crate) fn occupied(w: usize, r: usize, size: usize) -> usize {
    if w >= r {
        w - r
    } else {
        size - (r - w)
    }
}

/// Bytes available to the producer (one slot is always sacrificed)
#[inline]
pub(crate) fn vacant(w: usize, r: usize, size: usize) -> usize {
    size - 1 - occupied(w, r, size)
}

/// `pos + n` wrapped into `[0, size)`; requires `pos < size` and `n < size`
#[inline]
pub(crate) fn wrapping_add(pos: usize, n: usize, size: usize) -> usize {
    let next = pos + n;
    if next >= size {
        next - size
    } else {
        next
    }
}

/// Contiguous unread bytes starting at `r`
#[inline]
pub(crate) fn linear_readable(w: usize, r: usize, size: usize) -> usize {
    if w > r {
        w - r
    } else if r > w {
        size - r
    } else {
        0
    }
}

/// Contiguous writable bytes starting at `w`
///
/// When `r == 0` the last slot must stay empty, otherwise filling to the
/// end would wrap `w` onto `r` and the buffer would read as empty.
#[inline]
pub(crate) fn linear_writable(w: usize, r: usize, size: usize) -> usize {
    if w >= r {
        let len = size - w;
        if r == 0 {
            len - 1
        } else {
            len
        }
    } else {
        r - w - 1
    }
}
