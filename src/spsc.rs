//! Producer / consumer halves of a [`RingBuffer`]
//!
//! Splitting encodes the single-producer/single-consumer discipline in
//! the type system: only the [`Producer`] can move the write cursor and
//! only the [`Consumer`] can move the read cursor. Each half is `Send`,
//! so it can be handed to an ISR context, a DMA completion callback, or
//! another thread. No heap, no mutex, no critical sections.
//!
//! Author: Moroya Sakamoto

use core::ptr::NonNull;

use crate::error::Result;
use crate::ring::{Mode, RingBuffer};

/// Write half
#[derive(Debug)]
pub struct Producer<'b, 'a> {
    ring: &'b RingBuffer<'a>,
}

/// Read half
#[derive(Debug)]
pub struct Consumer<'b, 'a> {
    ring: &'b RingBuffer<'a>,
}

impl<'a> RingBuffer<'a> {
    /// Split into a producer and a consumer
    ///
    /// The buffer stays mutably borrowed until both halves are dropped,
    /// so [`reset`](RingBuffer::reset) cannot run while either side is
    /// active.
    pub fn split(&mut self) -> (Producer<'_, 'a>, Consumer<'_, 'a>) {
        let ring = &*self;
        (Producer { ring }, Consumer { ring })
    }
}

impl Producer<'_, '_> {
    /// Write as many bytes as fit; returns the count written
    pub fn write(&mut self, data: &[u8]) -> usize {
        self.write_ex(data, Mode::Partial).unwrap_or(0)
    }

    /// Write under the given [`Mode`]
    pub fn write_ex(&mut self, data: &[u8], mode: Mode) -> Result<usize> {
        // SAFETY: there is exactly one `Producer` per split.
        unsafe { self.ring.produce(data, mode) }
    }

    /// Commit `len` bytes already deposited at the linear write block
    pub fn advance(&mut self, len: usize) -> usize {
        // SAFETY: there is exactly one `Producer` per split.
        unsafe { self.ring.advance_unchecked(len) }
    }

    /// Contiguous free bytes starting at the write cursor
    pub fn linear_write_block(&mut self) -> &mut [u8] {
        // SAFETY: there is exactly one `Producer` per split, and the
        // slice borrows it mutably.
        unsafe { self.ring.write_block() }
    }

    /// See [`RingBuffer::linear_write_address`]
    pub fn linear_write_address(&self) -> Option<NonNull<u8>> {
        self.ring.linear_write_address()
    }

    /// See [`RingBuffer::linear_write_length`]
    pub fn linear_write_length(&self) -> usize {
        self.ring.linear_write_length()
    }

    /// Bytes that can be written right now
    pub fn free_len(&self) -> usize {
        self.ring.free_len()
    }

    /// Bytes waiting for the consumer
    pub fn full_len(&self) -> usize {
        self.ring.full_len()
    }
}

impl Consumer<'_, '_> {
    /// Read up to `out.len()` bytes; returns the count read
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        self.read_ex(out, Mode::Partial).unwrap_or(0)
    }

    /// Read under the given [`Mode`]
    pub fn read_ex(&mut self, out: &mut [u8], mode: Mode) -> Result<usize> {
        // SAFETY: there is exactly one `Consumer` per split.
        unsafe { self.ring.consume(out, mode) }
    }

    /// Copy without consuming, starting `skip` bytes in
    pub fn peek(&self, skip: usize, out: &mut [u8]) -> usize {
        self.ring.peek_at(skip, out)
    }

    /// Drop up to `len` bytes that were consumed in place
    pub fn skip(&mut self, len: usize) -> usize {
        // SAFETY: there is exactly one `Consumer` per split.
        unsafe { self.ring.skip_unchecked(len) }
    }

    /// Find `pattern` in the stored bytes; see [`RingBuffer::find`]
    pub fn find(&self, pattern: &[u8], start_offset: usize) -> Option<usize> {
        self.ring.find_from(pattern, start_offset)
    }

    /// Contiguous stored bytes starting at the read cursor
    pub fn linear_read_block(&self) -> &[u8] {
        // SAFETY: `skip`/`read` need `&mut self`, so the read cursor
        // cannot move while the slice is alive.
        unsafe { self.ring.read_block() }
    }

    /// See [`RingBuffer::linear_read_address`]
    pub fn linear_read_address(&self) -> Option<NonNull<u8>> {
        self.ring.linear_read_address()
    }

    /// See [`RingBuffer::linear_read_length`]
    pub fn linear_read_length(&self) -> usize {
        self.ring.linear_read_length()
    }

    /// Bytes that can be written right now
    pub fn free_len(&self) -> usize {
        self.ring.free_len()
    }

    /// Bytes waiting to be read
    pub fn full_len(&self) -> usize {
        self.ring.full_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_split_roundtrip() {
        let mut storage = [0u8; 16];
        let mut rb = RingBuffer::new(&mut storage).unwrap();
        let (mut tx, mut rx) = rb.split();

        assert_eq!(tx.write(b"ping"), 4);
        assert_eq!(rx.full_len(), 4);
        let mut out = [0u8; 4];
        assert_eq!(rx.read(&mut out), 4);
        assert_eq!(&out, b"ping");
        assert_eq!(tx.free_len(), 15);
    }

    #[test]
    fn test_reset_after_split_dropped() {
        let mut storage = [0u8; 8];
        let mut rb = RingBuffer::new(&mut storage).unwrap();
        {
            let (mut tx, _rx) = rb.split();
            tx.write(b"abc");
        }
        rb.reset();
        assert!(rb.is_empty());
    }

    #[test]
    fn test_dma_style_fill() {
        let mut storage = [0u8; 8];
        let mut rb = RingBuffer::new(&mut storage).unwrap();
        let (mut tx, mut rx) = rb.split();

        let block = tx.linear_write_block();
        let n = block.len().min(5);
        block[..n].copy_from_slice(&b"frame"[..n]);
        assert_eq!(tx.advance(n), 5);

        assert_eq!(rx.find(b"am", 0), Some(2));
        assert_eq!(rx.linear_read_block(), b"frame");
        assert_eq!(rx.skip(5), 5);
        assert_eq!(rx.full_len(), 0);
    }

    #[test]
    fn test_threaded_stream_in_order() {
        const TOTAL: usize = 100_000;
        let mut storage = [0u8; 64];
        let mut rb = RingBuffer::new(&mut storage).unwrap();
        let (mut tx, mut rx) = rb.split();

        thread::scope(|s| {
            s.spawn(move || {
                let mut next = 0usize;
                let mut chunk = [0u8; 13];
                while next < TOTAL {
                    let n = chunk.len().min(TOTAL - next);
                    for (i, b) in chunk[..n].iter_mut().enumerate() {
                        *b = ((next + i) % 251) as u8;
                    }
                    next += tx.write(&chunk[..n]);
                    thread::yield_now();
                }
            });

            let mut seen = 0usize;
            let mut out = [0u8; 17];
            while seen < TOTAL {
                let n = rx.read(&mut out);
                for &b in &out[..n] {
                    assert_eq!(b, (seen % 251) as u8);
                    seen += 1;
                }
            }
        });
    }
}
