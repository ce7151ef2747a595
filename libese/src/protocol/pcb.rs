// libese-rs/libese/src/protocol/pcb.rs

//! Protocol Control Byte model.
//!
//! Bit layout follows ISO/IEC 7816-3 11.3.2.2:
//!
//! ```text
//! I-block  0 S M 0 0 0 0 0   S = N(S), M = more data
//! R-block  1 0 0 N 0 0 E E   N = N(R), E = 01 parity/EDC, 10 other
//! S-block  1 1 R 0 0 0 T T   R = response, T = resync/IFS/abort/WTX
//! ```

use std::convert::TryFrom;
use std::fmt;

use crate::constants::*;
use crate::types::Seq;
use crate::{Error, Result};

/// S-block subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SupervisoryKind {
    /// Resynchronize sequence numbers
    #[display(fmt = "RESYNC")]
    Resync,
    /// Change the information field size
    #[display(fmt = "IFS")]
    Ifs,
    /// Abort a chain
    #[display(fmt = "ABORT")]
    Abort,
    /// Waiting time extension
    #[display(fmt = "WTX")]
    Wtx,
}

impl SupervisoryKind {
    fn bits(&self) -> u8 {
        match self {
            Self::Resync => PCB_S_RESYNC,
            Self::Ifs => PCB_S_IFS,
            Self::Abort => PCB_S_ABORT,
            Self::Wtx => PCB_S_WTX,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & PCB_S_TYPE_MASK {
            PCB_S_RESYNC => Self::Resync,
            PCB_S_IFS => Self::Ifs,
            PCB_S_ABORT => Self::Abort,
            _ => Self::Wtx,
        }
    }

    /// IFS and WTX carry a single INF byte; resync and abort carry none.
    pub fn inf_len(&self) -> usize {
        match self {
            Self::Ifs | Self::Wtx => 1,
            Self::Resync | Self::Abort => 0,
        }
    }
}

/// Decoded PCB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pcb {
    /// I-block
    Information {
        /// N(S)
        seq: Seq,
        /// More data follows in a chained block
        more: bool,
    },
    /// R-block
    ReceiveReady {
        /// N(R): the I-block expected next
        seq: Seq,
        /// EDC/parity error reported
        parity_error: bool,
        /// Other error reported
        other_error: bool,
    },
    /// S-block
    Supervisory {
        /// Subtype
        kind: SupervisoryKind,
        /// Response rather than request
        response: bool,
    },
}

impl Pcb {
    /// Any I-block.
    pub fn is_information(&self) -> bool {
        matches!(self, Pcb::Information { .. })
    }

    /// An R-block carrying either error flag.
    pub fn is_error_ack(&self) -> bool {
        matches!(
            self,
            Pcb::ReceiveReady {
                parity_error,
                other_error,
                ..
            } if *parity_error || *other_error
        )
    }

    /// S-block request of kind `which`.
    pub fn is_request(&self, which: SupervisoryKind) -> bool {
        matches!(self, Pcb::Supervisory { kind, response: false } if *kind == which)
    }

    /// S-block response of kind `which`.
    pub fn is_response(&self, which: SupervisoryKind) -> bool {
        matches!(self, Pcb::Supervisory { kind, response: true } if *kind == which)
    }
}

impl From<Pcb> for u8 {
    fn from(pcb: Pcb) -> u8 {
        match pcb {
            Pcb::Information { seq, more } => {
                let mut b = 0u8;
                if seq.is_set() {
                    b |= PCB_I_SEQ;
                }
                if more {
                    b |= PCB_I_MORE;
                }
                b
            }
            Pcb::ReceiveReady {
                seq,
                parity_error,
                other_error,
            } => {
                let mut b = PCB_R_BLOCK;
                if seq.is_set() {
                    b |= PCB_R_SEQ;
                }
                if parity_error {
                    b |= PCB_R_PARITY_ERROR;
                }
                if other_error {
                    b |= PCB_R_OTHER_ERROR;
                }
                b
            }
            Pcb::Supervisory { kind, response } => {
                let mut b = PCB_S_BLOCK | kind.bits();
                if response {
                    b |= PCB_S_RESPONSE;
                }
                b
            }
        }
    }
}

impl TryFrom<u8> for Pcb {
    type Error = Error;

    fn try_from(b: u8) -> Result<Self> {
        let reject = || Error::FrameFormat(format!("invalid pcb {:#04x}", b));
        match b & PCB_CATEGORY_MASK {
            PCB_S_BLOCK => {
                if b & !(PCB_CATEGORY_MASK | PCB_S_RESPONSE | PCB_S_TYPE_MASK) != 0 {
                    return Err(reject());
                }
                Ok(Pcb::Supervisory {
                    kind: SupervisoryKind::from_bits(b),
                    response: b & PCB_S_RESPONSE != 0,
                })
            }
            PCB_R_BLOCK => {
                let allowed =
                    PCB_CATEGORY_MASK | PCB_R_SEQ | PCB_R_PARITY_ERROR | PCB_R_OTHER_ERROR;
                let both = PCB_R_PARITY_ERROR | PCB_R_OTHER_ERROR;
                if b & !allowed != 0 || b & both == both {
                    return Err(reject());
                }
                Ok(Pcb::ReceiveReady {
                    seq: Seq::from_bit(b & PCB_R_SEQ != 0),
                    parity_error: b & PCB_R_PARITY_ERROR != 0,
                    other_error: b & PCB_R_OTHER_ERROR != 0,
                })
            }
            _ => {
                if b & !(PCB_I_SEQ | PCB_I_MORE) != 0 {
                    return Err(reject());
                }
                Ok(Pcb::Information {
                    seq: Seq::from_bit(b & PCB_I_SEQ != 0),
                    more: b & PCB_I_MORE != 0,
                })
            }
        }
    }
}

impl fmt::Display for Pcb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pcb::Information { seq, more } => {
                write!(f, "I({}, {})", seq.as_u8(), if *more { 1 } else { 0 })
            }
            Pcb::ReceiveReady {
                seq,
                parity_error,
                other_error,
            } => {
                let err = match (parity_error, other_error) {
                    (true, _) => ", parity",
                    (_, true) => ", other",
                    _ => "",
                };
                write!(f, "R({}{})", seq.as_u8(), err)
            }
            Pcb::Supervisory { kind, response } => {
                write!(f, "S({} {})", kind, if *response { "resp" } else { "req" })
            }
        }
    }
}
