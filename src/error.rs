//! Error type
//!
//! Author: Moroya Sakamoto

use core::fmt;

/// Result type used by the ring buffer interfaces
pub type Result<T> = core::result::Result<T, Error>;

/// Failure reasons for ring buffer operations
///
/// None of these are faults: nothing was transferred and the buffer
/// state is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Backing storage was empty at construction
    InvalidConfig,
    /// Buffer was detached, or the request carried no bytes
    Invalid,
    /// No free space at all
    Full,
    /// No stored data at all
    Empty,
    /// All-or-nothing write larger than the free space
    InsufficientSpace,
    /// All-or-nothing read larger than the stored data
    InsufficientData,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::InvalidConfig => "backing storage must not be empty",
            Error::Invalid => "buffer not ready or zero-length request",
            Error::Full => "ring buffer is full",
            Error::Empty => "ring buffer is empty",
            Error::InsufficientSpace => "not enough free space for all-or-nothing write",
            Error::InsufficientData => "not enough stored data for all-or-nothing read",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Error::Full.to_string(), "ring buffer is full");
        assert_eq!(Error::InvalidConfig.to_string(), "backing storage must not be empty");
    }
}
