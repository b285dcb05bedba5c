//! Byte ring buffer over caller-supplied storage
//!
//! One slot of the storage is always kept empty so that `w == r` means
//! empty and `w + 1 == r` (mod size) means full. A buffer over `N` bytes
//! therefore holds at most `N - 1` bytes of payload.
//!
//! Copies happen first, the owning cursor is published afterwards, so
//! the other side never sees a cursor ahead of the bytes it covers.
//!
//! Author: Moroya Sakamoto

use core::cmp::min;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};
use core::slice;

use crate::cursor::{self, Cursor};
use crate::error::{Error, Result};
use crate::event::{Event, EventHook};

/// Transfer mode for [`RingBuffer::write_ex`] / [`RingBuffer::read_ex`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Transfer `min(requested, available)` bytes
    #[default]
    Partial,
    /// Transfer everything or nothing
    AllOrNothing,
}

/// Lock-free SPSC byte ring buffer
///
/// Borrows its storage for `'a`; never allocates. Used directly through
/// `&mut self` from a single context, or [`split`](RingBuffer::split)
/// into a producer and a consumer that may live on different
/// cores/priorities.
pub struct RingBuffer<'a> {
    /// Start of the borrowed storage (`None` once detached)
    storage: Option<NonNull<u8>>,
    /// Storage length in bytes
    size: usize,
    /// Write cursor (owned by producer)
    w: Cursor,
    /// Read cursor (owned by consumer)
    r: Cursor,
    /// Optional observer
    hook: Option<&'a dyn EventHook>,
    _storage: PhantomData<&'a mut [u8]>,
}

// The storage is only reached through the producer/consumer partition:
// bytes in `[r, w)` belong to the consumer, the rest to the producer.
unsafe impl Send for RingBuffer<'_> {}
unsafe impl Sync for RingBuffer<'_> {}

impl<'a> RingBuffer<'a> {
    /// Create a ring buffer over `storage`
    ///
    /// Usable capacity is `storage.len() - 1`, so size the slice as
    /// `desired_bytes + 1`. Fails with [`Error::InvalidConfig`] when
    /// the slice is empty.
    pub fn new(storage: &'a mut [u8]) -> Result<Self> {
        if storage.is_empty() {
            warn!("ring buffer init rejected: empty storage");
            return Err(Error::InvalidConfig);
        }
        Ok(Self {
            size: storage.len(),
            storage: NonNull::new(storage.as_mut_ptr()),
            w: Cursor::new(),
            r: Cursor::new(),
            hook: None,
            _storage: PhantomData,
        })
    }

    /// Is the buffer attached to storage and usable?
    pub fn is_ready(&self) -> bool {
        self.storage.is_some() && self.size > 0
    }

    /// Detach from the storage
    ///
    /// Nothing is deallocated (the storage belongs to the caller). Every
    /// later operation reports the invalid result.
    pub fn detach(&mut self) {
        if self.is_ready() {
            debug!("ring buffer detached from {} bytes of storage", self.size);
            self.storage = None;
            self.size = 0;
        }
    }

    /// Register the event hook, replacing any previous one
    /// (ignored on a detached buffer)
    pub fn set_event_hook(&mut self, hook: &'a dyn EventHook) {
        if self.is_ready() {
            self.hook = Some(hook);
        }
    }

    /// Remove the event hook
    pub fn clear_event_hook(&mut self) {
        self.hook = None;
    }

    /// Storage length in bytes (usable payload is one less)
    pub fn capacity(&self) -> usize {
        self.size
    }

    /// Bytes that can be written right now
    pub fn free_len(&self) -> usize {
        if !self.is_ready() {
            return 0;
        }
        let w = self.w.snapshot();
        let r = self.r.snapshot();
        cursor::vacant(w, r, self.size)
    }

    /// Bytes that can be read right now
    pub fn full_len(&self) -> usize {
        if !self.is_ready() {
            return 0;
        }
        let w = self.w.snapshot();
        let r = self.r.snapshot();
        cursor::occupied(w, r, self.size)
    }

    /// Is the buffer empty?
    pub fn is_empty(&self) -> bool {
        self.full_len() == 0
    }

    /// Is the buffer full? A detached buffer is neither empty nor full.
    pub fn is_full(&self) -> bool {
        self.is_ready() && self.free_len() == 0
    }

    /// Write as many bytes of `data` as fit; returns the count written
    pub fn write(&mut self, data: &[u8]) -> usize {
        self.write_ex(data, Mode::Partial).unwrap_or(0)
    }

    /// Write `data` under the given [`Mode`]
    pub fn write_ex(&mut self, data: &[u8], mode: Mode) -> Result<usize> {
        // SAFETY: `&mut self` makes this the only producer.
        unsafe { self.produce(data, mode) }
    }

    /// Read up to `out.len()` bytes; returns the count read
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        self.read_ex(out, Mode::Partial).unwrap_or(0)
    }

    /// Read into `out` under the given [`Mode`]
    pub fn read_ex(&mut self, out: &mut [u8], mode: Mode) -> Result<usize> {
        // SAFETY: `&mut self` makes this the only consumer.
        unsafe { self.consume(out, mode) }
    }

    /// Copy stored bytes without consuming them, starting `skip` bytes in
    pub fn peek(&self, skip: usize, out: &mut [u8]) -> usize {
        self.peek_at(skip, out)
    }

    /// Mark up to `len` bytes as read without copying them out
    pub fn skip(&mut self, len: usize) -> usize {
        // SAFETY: `&mut self` makes this the only consumer.
        unsafe { self.skip_unchecked(len) }
    }

    /// Mark up to `len` bytes as written after filling them in place
    pub fn advance(&mut self, len: usize) -> usize {
        // SAFETY: `&mut self` makes this the only producer.
        unsafe { self.advance_unchecked(len) }
    }

    /// Find `pattern` in the stored bytes, searching from `start_offset`
    ///
    /// Returns the offset relative to the oldest stored byte.
    pub fn find(&self, pattern: &[u8], start_offset: usize) -> Option<usize> {
        self.find_from(pattern, start_offset)
    }

    /// Clear both cursors and fire [`Event::Reset`]
    ///
    /// Requires exclusive access, so it cannot race a split
    /// producer or consumer.
    pub fn reset(&mut self) {
        if !self.is_ready() {
            return;
        }
        self.w.publish(0);
        self.r.publish(0);
        debug!("ring buffer reset");
        self.notify(Event::Reset, 0);
    }

    /// Address of the first unread byte
    pub fn linear_read_address(&self) -> Option<NonNull<u8>> {
        let base = self.base()?;
        // SAFETY: r < size, so the offset stays inside the storage.
        NonNull::new(unsafe { base.as_ptr().add(self.r.snapshot()) })
    }

    /// Unread bytes available at [`linear_read_address`](Self::linear_read_address)
    /// before wraparound
    pub fn linear_read_length(&self) -> usize {
        if !self.is_ready() {
            return 0;
        }
        cursor::linear_readable(self.w.snapshot(), self.r.snapshot(), self.size)
    }

    /// Address of the next byte to write
    pub fn linear_write_address(&self) -> Option<NonNull<u8>> {
        let base = self.base()?;
        // SAFETY: w < size, so the offset stays inside the storage.
        NonNull::new(unsafe { base.as_ptr().add(self.w.snapshot()) })
    }

    /// Bytes writable at [`linear_write_address`](Self::linear_write_address)
    /// before wraparound
    pub fn linear_write_length(&self) -> usize {
        if !self.is_ready() {
            return 0;
        }
        cursor::linear_writable(self.w.snapshot(), self.r.snapshot(), self.size)
    }

    /// Contiguous unread bytes, ready for in-place processing and [`skip`](Self::skip)
    pub fn linear_read_block(&self) -> &[u8] {
        // SAFETY: `&self` on the owning buffer excludes a concurrent consumer.
        unsafe { self.read_block() }
    }

    /// Contiguous free bytes, ready to be filled and [`advance`](Self::advance)d
    pub fn linear_write_block(&mut self) -> &mut [u8] {
        // SAFETY: `&mut self` makes this the only producer.
        unsafe { self.write_block() }
    }

    // ---- shared core, also driven by `Producer` / `Consumer` ----

    fn base(&self) -> Option<NonNull<u8>> {
        if self.size == 0 {
            return None;
        }
        self.storage
    }

    fn notify(&self, event: Event, len: usize) {
        if let Some(hook) = self.hook {
            hook.on_event(event, len);
        }
    }

    /// # Safety
    /// Caller must be the only producer for the duration of the call.
    pub(crate) unsafe fn produce(&self, data: &[u8], mode: Mode) -> Result<usize> {
        let base = match self.base() {
            Some(base) if !data.is_empty() => base.as_ptr(),
            _ => return Err(Error::Invalid),
        };

        let w = self.w.snapshot();
        let free = cursor::vacant(w, self.r.observe(), self.size);
        if free == 0 {
            return Err(Error::Full);
        }
        if mode == Mode::AllOrNothing && free < data.len() {
            debug!("write of {} bytes rejected, {} free", data.len(), free);
            return Err(Error::InsufficientSpace);
        }

        let len = min(free, data.len());
        let linear = min(self.size - w, len);
        // SAFETY: `[w, w + linear)` and `[0, len - linear)` lie in the
        // free region, which the consumer does not touch.
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), base.add(w), linear);
            if len > linear {
                ptr::copy_nonoverlapping(data.as_ptr().add(linear), base, len - linear);
            }
        }

        let next = cursor::wrapping_add(w, len, self.size);
        self.w.publish(next);
        trace!("write {} bytes, w {} -> {}", len, w, next);
        self.notify(Event::Write, len);
        Ok(len)
    }

    /// # Safety
    /// Caller must be the only consumer for the duration of the call.
    pub(crate) unsafe fn consume(&self, out: &mut [u8], mode: Mode) -> Result<usize> {
        let base = match self.base() {
            Some(base) if !out.is_empty() => base.as_ptr(),
            _ => return Err(Error::Invalid),
        };

        let r = self.r.snapshot();
        let full = cursor::occupied(self.w.observe(), r, self.size);
        if full == 0 {
            return Err(Error::Empty);
        }
        if mode == Mode::AllOrNothing && full < out.len() {
            debug!("read of {} bytes rejected, {} stored", out.len(), full);
            return Err(Error::InsufficientData);
        }

        let len = min(full, out.len());
        let linear = min(self.size - r, len);
        // SAFETY: `[r, r + linear)` and `[0, len - linear)` lie in the
        // occupied region, which the producer does not touch.
        unsafe {
            ptr::copy_nonoverlapping(base.add(r), out.as_mut_ptr(), linear);
            if len > linear {
                ptr::copy_nonoverlapping(base, out.as_mut_ptr().add(linear), len - linear);
            }
        }

        let next = cursor::wrapping_add(r, len, self.size);
        self.r.publish(next);
        trace!("read {} bytes, r {} -> {}", len, r, next);
        self.notify(Event::Read, len);
        Ok(len)
    }

    pub(crate) fn peek_at(&self, skip: usize, out: &mut [u8]) -> usize {
        let base = match self.base() {
            Some(base) if !out.is_empty() => base.as_ptr(),
            _ => return 0,
        };

        let r = self.r.snapshot();
        let full = cursor::occupied(self.w.observe(), r, self.size);
        if skip >= full {
            return 0;
        }
        let start = cursor::wrapping_add(r, skip, self.size);
        let len = min(full - skip, out.len());
        let linear = min(self.size - start, len);
        // SAFETY: the copied range lies inside the occupied region.
        unsafe {
            ptr::copy_nonoverlapping(base.add(start), out.as_mut_ptr(), linear);
            if len > linear {
                ptr::copy_nonoverlapping(base, out.as_mut_ptr().add(linear), len - linear);
            }
        }
        len
    }

    /// # Safety
    /// Caller must be the only consumer for the duration of the call.
    pub(crate) unsafe fn skip_unchecked(&self, len: usize) -> usize {
        if !self.is_ready() || len == 0 {
            return 0;
        }
        let r = self.r.snapshot();
        let len = min(len, cursor::occupied(self.w.observe(), r, self.size));
        let next = cursor::wrapping_add(r, len, self.size);
        self.r.publish(next);
        trace!("skip {} bytes, r {} -> {}", len, r, next);
        self.notify(Event::Read, len);
        len
    }

    /// # Safety
    /// Caller must be the only producer for the duration of the call.
    pub(crate) unsafe fn advance_unchecked(&self, len: usize) -> usize {
        if !self.is_ready() || len == 0 {
            return 0;
        }
        let w = self.w.snapshot();
        let len = min(len, cursor::vacant(w, self.r.observe(), self.size));
        let next = cursor::wrapping_add(w, len, self.size);
        self.w.publish(next);
        trace!("advance {} bytes, w {} -> {}", len, w, next);
        self.notify(Event::Write, len);
        len
    }

    pub(crate) fn find_from(&self, pattern: &[u8], start_offset: usize) -> Option<usize> {
        let base = self.base()?.as_ptr();
        if pattern.is_empty() {
            return None;
        }

        let r = self.r.snapshot();
        let full = cursor::occupied(self.w.observe(), r, self.size);
        if full < pattern.len().checked_add(start_offset)? {
            return None;
        }

        let byte_at = |offset: usize| {
            let idx = cursor::wrapping_add(r, offset, self.size);
            // SAFETY: offset < full, so idx points at a stored byte.
            unsafe { *base.add(idx) }
        };
        (start_offset..=full - pattern.len()).find(|&start| {
            pattern
                .iter()
                .enumerate()
                .all(|(i, &b)| byte_at(start + i) == b)
        })
    }

    /// # Safety
    /// No other consumer may skip or read while the slice is alive.
    pub(crate) unsafe fn read_block(&self) -> &[u8] {
        let Some(base) = self.base() else {
            return &[];
        };
        let r = self.r.snapshot();
        let len = cursor::linear_readable(self.w.observe(), r, self.size);
        // SAFETY: `[r, r + len)` is stored data the producer won't overwrite.
        unsafe { slice::from_raw_parts(base.as_ptr().add(r), len) }
    }

    /// # Safety
    /// Caller must be the only producer while the slice is alive.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn write_block(&self) -> &mut [u8] {
        let Some(base) = self.base() else {
            return &mut [];
        };
        let w = self.w.snapshot();
        let len = cursor::linear_writable(w, self.r.observe(), self.size);
        // SAFETY: `[w, w + len)` is free space the consumer won't read.
        unsafe { slice::from_raw_parts_mut(base.as_ptr().add(w), len) }
    }
}

impl fmt::Debug for RingBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("size", &self.size)
            .field("w", &self.w)
            .field("r", &self.r)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}
