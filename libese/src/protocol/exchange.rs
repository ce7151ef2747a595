// libese-rs/libese/src/protocol/exchange.rs

//! Per-call exchange state.
//!
//! An `Exchange` lives for exactly one transceive call. It borrows the
//! session's sequence bits and the caller's TX/RX segments, and is put back
//! to its initial values whenever the session is resynchronized.

use crate::protocol::Frame;
use crate::types::{Ifs, SequenceState};
use crate::utils::{copy_from_flat, copy_into_flat, total_len};

/// Position inside a scatter-gather list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub offset: usize,
    pub remaining: usize,
}

impl Cursor {
    pub fn new(total: usize) -> Self {
        Self {
            offset: 0,
            remaining: total,
        }
    }

    pub fn advance(&mut self, n: usize) {
        let n = n.min(self.remaining);
        self.offset += n;
        self.remaining -= n;
    }
}

pub(crate) struct Exchange<'a, 'r> {
    /// Pending WTX multiplier for the next receive.
    pub wait_mult: u8,
    pub ifs: Ifs,
    pub errors: u32,
    pub retransmits: u32,
    /// Reason for the most recent receive error, quoted when escalation
    /// gives up.
    pub last_error: Option<String>,
    /// Card data did not fit the RX segments.
    pub overflowed: bool,
    pub seq: &'a mut SequenceState,
    pub tx: Cursor,
    pub rx: Cursor,
    tx_data: &'a [&'a [u8]],
    rx_data: &'a mut [&'r mut [u8]],
}

impl<'a, 'r> Exchange<'a, 'r> {
    pub fn new(
        seq: &'a mut SequenceState,
        tx_data: &'a [&'a [u8]],
        rx_data: &'a mut [&'r mut [u8]],
    ) -> Self {
        let tx = Cursor::new(total_len(tx_data));
        let rx = Cursor::new(total_len(rx_data));
        Self {
            wait_mult: 1,
            ifs: Ifs::default(),
            errors: 0,
            retransmits: 0,
            last_error: None,
            overflowed: false,
            seq,
            tx,
            rx,
            tx_data,
            rx_data,
        }
    }

    /// Restore the template: fresh sequence bits, maximum IFS, cleared
    /// counters and rewound cursors.
    pub fn reset(&mut self) {
        *self.seq = SequenceState::new();
        self.wait_mult = 1;
        self.ifs = Ifs::default();
        self.errors = 0;
        self.retransmits = 0;
        self.last_error = None;
        self.overflowed = false;
        self.tx = Cursor::new(self.tx.offset + self.tx.remaining);
        self.rx = Cursor::new(self.rx.offset + self.rx.remaining);
    }

    /// Build the next I-block from the TX cursor. `more` is set when
    /// data is left over for a following block.
    pub fn next_information(&mut self) -> Frame {
        let mut inf = vec![0u8; self.tx.remaining.min(self.ifs.as_usize())];
        let n = copy_into_flat(self.tx_data, self.tx.offset, &mut inf);
        inf.truncate(n);
        self.tx.advance(n);
        Frame::information(self.seq.next_host(), self.tx.remaining > 0, inf)
    }

    /// Copy card data into the RX segments. Returns how much fitted.
    pub fn deliver(&mut self, inf: &[u8]) -> usize {
        let n = copy_from_flat(self.rx_data, self.rx.offset, inf);
        self.rx.advance(n);
        n
    }

    /// RX bytes written so far.
    pub fn received(&self) -> usize {
        self.rx.offset
    }

    pub fn note_error(&mut self, what: impl Into<String>) {
        self.errors += 1;
        self.last_error = Some(what.into());
    }

    /// `what`, followed by the last receive error if there was one.
    pub fn describe(&self, what: &str) -> String {
        match &self.last_error {
            Some(cause) => format!("{} (last error: {})", what, cause),
            None => what.to_string(),
        }
    }
}
