// libese-rs/libese/src/transport/traits.rs

//! Backend capability contract.

use std::time::Duration;

use crate::config::OpenOptions;
use crate::protocol::Frame;
use crate::{Error, Result};

/// Result of waiting for the first byte of a card frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// The expected byte arrived. `consumed` tells whether the backend
    /// already took it off the wire.
    Matched {
        /// The matched byte is no longer on the wire
        consumed: bool,
    },
    /// Nothing matching arrived before the timeout.
    NotMatched,
}

/// Transport trait abstracts the secure element link away from the T=1
/// engine. Failures are reported as `Error::Backend(index)` where `index`
/// points into `error_messages()`.
pub trait Transport {
    /// Short backend name, e.g. `"nxp-pn80t-spidev"`.
    fn name(&self) -> &str;

    /// Backend-specific error descriptions indexed by `Error::Backend`.
    fn error_messages(&self) -> &[&'static str] {
        &[]
    }

    /// Bring the link up.
    fn open(&mut self, options: &OpenOptions) -> Result<()>;

    /// Release the link.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether the link is currently usable.
    fn is_open(&self) -> bool {
        true
    }

    /// Write raw bytes and return how many were written. `is_final` marks
    /// the end of a frame so bus-level framing (chip select and the like)
    /// can be released. The engine hands over each frame in one call with
    /// `is_final` set; a short count fails the exchange.
    fn raw_transmit(&mut self, data: &[u8], is_final: bool) -> Result<usize>;

    /// Read up to `buf.len()` raw bytes.
    fn raw_receive(&mut self, buf: &mut [u8], is_final: bool) -> Result<usize>;

    /// Wait up to `timeout` for `expected`. When `consume` is set the
    /// backend may take the byte off the wire and must say so.
    fn poll(&mut self, expected: u8, timeout: Duration, consume: bool) -> Result<PollStatus>;

    /// Whether `hardware_reset` is implemented.
    fn supports_hardware_reset(&self) -> bool {
        false
    }

    /// Power-cycle or reset the secure element. The default reports the
    /// capability as missing, which callers can tell apart from a failed
    /// reset.
    fn hardware_reset(&mut self) -> Result<()> {
        Err(Error::UnsupportedOperation("hardware reset".into()))
    }

    /// Backends that emulate the whole exchange return `Some`; the T=1
    /// engine is used otherwise.
    fn transceive(&mut self, _tx: &[&[u8]], _rx: &mut [&mut [u8]]) -> Option<Result<usize>> {
        None
    }

    /// Called on every outgoing frame before its LRC is computed, e.g. to
    /// rewrite the NAD for controller quirks.
    fn before_transmit(&mut self, _frame: &mut Frame) {}

    /// Called on every frame that decoded successfully.
    fn after_receive(&mut self, _frame: &mut Frame) {}
}
