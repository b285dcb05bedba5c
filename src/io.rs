//! `std::io` adapters
//!
//! Transfers are partial. A full buffer fails writes and an empty buffer
//! fails reads with [`io::ErrorKind::WouldBlock`], so a live stream is
//! never mistaken for EOF; a detached buffer reads and writes `Ok(0)`.
//!
//! Author: Moroya Sakamoto

use std::io;

use crate::error::{Error, Result};
use crate::ring::{Mode, RingBuffer};
use crate::spsc::{Consumer, Producer};

fn to_io(res: Result<usize>) -> io::Result<usize> {
    match res {
        Ok(n) => Ok(n),
        Err(Error::Full) | Err(Error::Empty) => Err(io::ErrorKind::WouldBlock.into()),
        Err(_) => Ok(0),
    }
}

impl io::Write for RingBuffer<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        to_io(self.write_ex(buf, Mode::Partial))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for RingBuffer<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        to_io(self.read_ex(buf, Mode::Partial))
    }
}

impl io::Write for Producer<'_, '_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        to_io(self.write_ex(buf, Mode::Partial))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for Consumer<'_, '_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        to_io(self.read_ex(buf, Mode::Partial))
    }
}
