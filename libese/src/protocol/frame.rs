// libese-rs/libese/src/protocol/frame.rs

//! T=1 block codec.

use std::convert::TryFrom;

use crate::constants::{T1_HEADER_LEN, T1_INVALID_LEN, T1_LRC_LEN, T1_MAX_INF_LEN};
use crate::protocol::checksum::lrc;
use crate::protocol::pcb::{Pcb, SupervisoryKind};
use crate::types::Seq;
use crate::{Error, Result};

/// T=1 block helper. Provides encode/decode of the wire frame
/// Format: [NAD(1)] [PCB(1)] [LEN(1)] [INF(LEN)] [LRC(1)]
/// LRC: XOR of NAD through the last INF byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Node address; overwritten on transmit.
    pub nad: u8,
    /// Protocol control byte
    pub pcb: Pcb,
    /// Information field, at most 254 bytes on the wire
    pub inf: Vec<u8>,
}

impl Frame {
    /// Frame with a zero NAD.
    pub fn new(pcb: Pcb, inf: Vec<u8>) -> Self {
        Self { nad: 0, pcb, inf }
    }

    /// I-block.
    pub fn information(seq: Seq, more: bool, inf: Vec<u8>) -> Self {
        Self::new(Pcb::Information { seq, more }, inf)
    }

    /// Error-free R-block: "send I-block `seq` next".
    pub fn receive_ready(seq: Seq) -> Self {
        Self::new(
            Pcb::ReceiveReady {
                seq,
                parity_error: false,
                other_error: false,
            },
            Vec::new(),
        )
    }

    /// R-block asking the card to resend I-block `seq`.
    pub fn receive_ready_error(seq: Seq, parity_error: bool) -> Self {
        Self::new(
            Pcb::ReceiveReady {
                seq,
                parity_error,
                other_error: !parity_error,
            },
            Vec::new(),
        )
    }

    /// S-block request.
    pub fn request(kind: SupervisoryKind, inf: Vec<u8>) -> Self {
        Self::new(
            Pcb::Supervisory {
                kind,
                response: false,
            },
            inf,
        )
    }

    /// S-block response.
    pub fn response(kind: SupervisoryKind, inf: Vec<u8>) -> Self {
        Self::new(
            Pcb::Supervisory {
                kind,
                response: true,
            },
            inf,
        )
    }

    /// Total bytes on the wire for this frame.
    pub fn wire_len(&self) -> usize {
        T1_HEADER_LEN + self.inf.len() + T1_LRC_LEN
    }

    /// Encode into wire bytes, computing the trailing LRC.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.inf.len() > T1_MAX_INF_LEN {
            return Err(Error::InvalidLength {
                expected: T1_MAX_INF_LEN,
                actual: self.inf.len(),
            });
        }

        let mut out = Vec::with_capacity(self.wire_len());
        out.push(self.nad);
        out.push(u8::from(self.pcb));
        out.push(self.inf.len() as u8);
        out.extend_from_slice(&self.inf);
        out.push(lrc(&out));
        Ok(out)
    }

    /// Decode a full wire frame. The LRC is checked before the PCB so a
    /// corrupted frame always reports `ChecksumMismatch`.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let min = T1_HEADER_LEN + T1_LRC_LEN;
        if frame.len() < min {
            return Err(Error::InvalidLength {
                expected: min,
                actual: frame.len(),
            });
        }

        let len = frame[2];
        if len == T1_INVALID_LEN {
            return Err(Error::FrameFormat("reserved length 0xff".into()));
        }

        let required_len = min + len as usize;
        if frame.len() != required_len {
            return Err(Error::InvalidLength {
                expected: required_len,
                actual: frame.len(),
            });
        }

        let body_end = T1_HEADER_LEN + len as usize;
        let lrc_expected = lrc(&frame[..body_end]);
        let lrc_actual = frame[body_end];
        if lrc_actual != lrc_expected {
            return Err(Error::ChecksumMismatch {
                expected: lrc_expected,
                actual: lrc_actual,
            });
        }

        Ok(Self {
            nad: frame[0],
            pcb: Pcb::try_from(frame[1])?,
            inf: frame[T1_HEADER_LEN..body_end].to_vec(),
        })
    }

    /// One-line dump used by frame tracing.
    pub fn trace(&self) -> String {
        match self.encode() {
            Ok(bytes) => format!("{} {}", self.pcb, crate::utils::bytes_to_hex_spaced(&bytes)),
            Err(_) => format!("{} <{} byte INF>", self.pcb, self.inf.len()),
        }
    }
}
