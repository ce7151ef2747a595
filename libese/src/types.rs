// libese-rs/libese/src/types.rs

//! Sequence numbers and link parameters.

use crate::Error;
use crate::constants::T1_MAX_INF_LEN;
use std::convert::TryFrom;

/// Single-bit T=1 sequence number (N(S) / N(R)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Seq(bool);

impl Seq {
    /// N = 0
    pub const ZERO: Self = Self(false);
    /// N = 1
    pub const ONE: Self = Self(true);

    /// From the PCB bit.
    pub const fn from_bit(bit: bool) -> Self {
        Self(bit)
    }

    /// Whether the bit is 1.
    pub fn is_set(&self) -> bool {
        self.0
    }

    /// The other sequence number.
    pub fn next(&self) -> Self {
        Self(!self.0)
    }

    /// 0 or 1.
    pub fn as_u8(&self) -> u8 {
        self.0 as u8
    }
}

/// Per-session sequence state. `host` is the last N(S) this side sent and
/// `card` the last N(S) accepted from the card; both start at 1 so that the
/// first I-block in either direction carries 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceState {
    /// Last N(S) sent by this side
    pub host: Seq,
    /// Last N(S) accepted from the card
    pub card: Seq,
}

impl SequenceState {
    /// Fresh session: the first I-block each way carries 0.
    pub const fn new() -> Self {
        Self {
            host: Seq::ONE,
            card: Seq::ONE,
        }
    }

    /// N(S) for the next I-block this side sends.
    pub fn next_host(&self) -> Seq {
        self.host.next()
    }

    /// N(S) the next card I-block must carry.
    pub fn next_card(&self) -> Seq {
        self.card.next()
    }
}

impl Default for SequenceState {
    fn default() -> Self {
        Self::new()
    }
}

/// Information Field Size (1..=254)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ifs(u8);

impl Ifs {
    /// Largest IFS, also the default.
    pub const MAX: Self = Self(T1_MAX_INF_LEN as u8);

    /// Size in bytes.
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Wire value.
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl Default for Ifs {
    fn default() -> Self {
        Self::MAX
    }
}

impl TryFrom<u8> for Ifs {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value == 0 || value as usize > T1_MAX_INF_LEN {
            return Err(Error::FrameFormat(format!("invalid IFS {}", value)));
        }
        Ok(Self(value))
    }
}
