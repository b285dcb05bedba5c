//! ALICE-RingBuf — Lock-free SPSC byte ring buffer
//!
//! Move bytes between an ISR and a task, or a DMA engine and
//! application code, without locks:
//! - Caller-owned storage (no heap, no allocation)
//! - One producer, one consumer, atomic cursors with release/acquire publishing
//! - Partial or all-or-nothing bulk transfers, peek, skip, advance
//! - Linear-block access for zero-copy DMA
//! - Optional event hook, `log`/`defmt` tracing, `std::io` and C-ABI adapters
//!
//! ```
//! use alice_ringbuf::RingBuffer;
//!
//! let mut storage = [0u8; 9]; // 8 usable bytes
//! let mut rb = RingBuffer::new(&mut storage).unwrap();
//! assert_eq!(rb.write(b"abc"), 3);
//!
//! let (mut tx, mut rx) = rb.split();
//! tx.write(b"def");
//! let mut out = [0u8; 6];
//! assert_eq!(rx.read(&mut out), 6);
//! assert_eq!(&out, b"abcdef");
//! ```
//!
//! Author: Moroya Sakamoto

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
mod fmt;

mod cursor;
pub mod error;
pub mod event;
pub mod ring;
pub mod spsc;

#[cfg(feature = "std")]
mod io;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use error::{Error, Result};
pub use event::{Event, EventHook};
pub use ring::{Mode, RingBuffer};
pub use spsc::{Consumer, Producer};
