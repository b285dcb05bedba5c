//! Event notification hook
//!
//! Author: Moroya Sakamoto

/// Completed buffer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Bytes were consumed (`read`, `read_ex` or `skip`)
    Read,
    /// Bytes were produced (`write`, `write_ex` or `advance`)
    Write,
    /// Both cursors were cleared
    Reset,
}

/// Observer invoked synchronously after an operation completes
///
/// Runs on whichever context performed the operation, so it must be
/// `Sync`. It must not call back into the buffer from the opposite side
/// (e.g. write from within a consumer's read notification).
pub trait EventHook: Sync {
    /// `len` is the number of bytes transferred, `0` for [`Event::Reset`]
    fn on_event(&self, event: Event, len: usize);
}

impl<F> EventHook for F
where
    F: Fn(Event, usize) + Sync,
{
    fn on_event(&self, event: Event, len: usize) {
        self(event, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_is_hook() {
        let total = AtomicUsize::new(0);
        let hook = |event: Event, len: usize| {
            if event == Event::Write {
                total.fetch_add(len, Ordering::Relaxed);
            }
        };
        let dyn_hook: &dyn EventHook = &hook;
        dyn_hook.on_event(Event::Write, 5);
        dyn_hook.on_event(Event::Read, 3);
        assert_eq!(total.load(Ordering::Relaxed), 5);
    }
}
