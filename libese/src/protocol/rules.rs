// libese-rs/libese/src/protocol/rules.rs

//! T=1 rule table.
//!
//! Every receive is judged against two frames: the last I- or R-block this
//! side sent (`last_tx`, the frame the exchange is really waiting on) and
//! the frame that actually went out on the previous leg (`on_wire`), which
//! differs from `last_tx` after an error R-block, a supervisory reply or a
//! resync request.

use std::convert::TryFrom;

use log::{debug, warn};

use crate::config::{RESET_ERROR_THRESHOLD, RESYNC_ERROR_THRESHOLD};
use crate::protocol::exchange::Exchange;
use crate::protocol::frame::Frame;
use crate::protocol::pcb::{Pcb, SupervisoryKind};
use crate::types::{Ifs, Seq};

/// What the receive path produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Received {
    Frame(Frame),
    /// Nothing usable arrived. `parity` is set for LRC failures so the
    /// error R-block can say so.
    Invalid { parity: bool, reason: String },
}

impl Received {
    pub(crate) fn timeout() -> Self {
        Received::Invalid {
            parity: false,
            reason: "timeout".into(),
        }
    }
}

/// Decision for the next leg of an exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The exchange finished; RX data is in place.
    Complete,
    /// Progress was made; send this frame and wait on it from now on.
    Continue(Frame),
    /// Send this already-sent frame again.
    Retransmit(Frame),
    /// Send this frame once while still waiting on `last_tx`.
    SingleShot(Frame),
    /// Resync acknowledged: restart the exchange from the first block.
    ResetSession,
    /// Too many receive errors: reset the secure element, then restart.
    ResetDevice,
    /// The card aborted; send the optional reply and give up.
    Abort(Option<Frame>),
}

/// Check a received frame for well-formedness and sequencing. Failures are
/// counted on the exchange and turned into `Received::Invalid`.
pub(crate) fn validate(ex: &mut Exchange<'_, '_>, rx: Received) -> Received {
    let frame = match rx {
        Received::Frame(frame) => frame,
        Received::Invalid { parity, reason } => {
            ex.note_error(reason.clone());
            return Received::Invalid { parity, reason };
        }
    };

    let problem = match frame.pcb {
        Pcb::Information { seq, .. } if seq != ex.seq.next_card() => {
            Some(format!("I-block out of sequence (N(S)={})", seq.as_u8()))
        }
        Pcb::ReceiveReady { .. } if !frame.inf.is_empty() => {
            Some("R-block with information field".to_string())
        }
        Pcb::Supervisory { kind, .. } if frame.inf.len() != kind.inf_len() => {
            Some(format!("{} block with {} INF bytes", kind, frame.inf.len()))
        }
        Pcb::Supervisory {
            kind: SupervisoryKind::Ifs,
            ..
        } if Ifs::try_from(frame.inf[0]).is_err() => Some(format!("bad IFS {}", frame.inf[0])),
        Pcb::Supervisory {
            kind: SupervisoryKind::Wtx,
            ..
        } if frame.inf[0] == 0 => Some("WTX of zero".to_string()),
        _ => None,
    };

    match problem {
        Some(reason) => {
            debug!("rejecting {}: {}", frame.pcb, reason);
            ex.note_error(reason.clone());
            Received::Invalid {
                parity: false,
                reason,
            }
        }
        None => Received::Frame(frame),
    }
}

/// Validate `rx` and map (last_tx, on_wire, rx) to an outcome. A frame
/// that decodes but fits no rule is downgraded to an invalid receive.
pub(crate) fn evaluate(ex: &mut Exchange<'_, '_>, last_tx: &Frame, on_wire: &Frame, rx: Received) -> Outcome {
    let frame = match validate(ex, rx) {
        Received::Frame(frame) => frame,
        Received::Invalid { parity, .. } => return on_invalid(ex, on_wire, parity),
    };
    if let Some(outcome) = apply(ex, last_tx, on_wire, &frame) {
        return outcome;
    }
    let reason = format!("unexpected {} after {}", frame.pcb, on_wire.pcb);
    debug!("{}", reason);
    ex.note_error(reason);
    on_invalid(ex, on_wire, false)
}

fn apply(ex: &mut Exchange<'_, '_>, last_tx: &Frame, on_wire: &Frame, frame: &Frame) -> Option<Outcome> {
    // While a resync or abort request is outstanding only its response
    // is acceptable.
    if let Pcb::Supervisory {
        kind,
        response: false,
    } = on_wire.pcb
    {
        if matches!(kind, SupervisoryKind::Resync | SupervisoryKind::Abort) {
            return match frame.pcb {
                Pcb::Supervisory {
                    kind: k,
                    response: true,
                } if k == kind => Some(match kind {
                    SupervisoryKind::Resync => Outcome::ResetSession,
                    _ => Outcome::Complete,
                }),
                _ => None,
            };
        }
    }

    match frame.pcb {
        Pcb::Supervisory {
            kind,
            response: false,
        } => on_card_request(ex, kind, &frame.inf),
        Pcb::Supervisory { .. } => None,
        Pcb::ReceiveReady { seq, .. } => on_receive_ready(ex, last_tx, seq),
        Pcb::Information { seq, more } => on_information(ex, last_tx, seq, more, &frame.inf),
    }
}

fn on_invalid(ex: &mut Exchange<'_, '_>, on_wire: &Frame, parity: bool) -> Outcome {
    if ex.errors >= RESET_ERROR_THRESHOLD {
        warn!("{} consecutive receive errors; resetting device", ex.errors);
        return Outcome::ResetDevice;
    }
    if on_wire.pcb.is_error_ack()
        || on_wire.pcb.is_request(SupervisoryKind::Abort)
        || on_wire.pcb.is_request(SupervisoryKind::Resync)
    {
        return Outcome::Retransmit(on_wire.clone());
    }
    if ex.errors >= RESYNC_ERROR_THRESHOLD {
        warn!("{} consecutive receive errors; requesting resync", ex.errors);
        return Outcome::SingleShot(Frame::request(SupervisoryKind::Resync, Vec::new()));
    }
    Outcome::SingleShot(Frame::receive_ready_error(ex.seq.next_card(), parity))
}

fn on_card_request(ex: &mut Exchange<'_, '_>, kind: SupervisoryKind, inf: &[u8]) -> Option<Outcome> {
    match kind {
        SupervisoryKind::Wtx => {
            debug!("card requested WTX x{}", inf[0]);
            ex.wait_mult = inf[0];
            Some(Outcome::SingleShot(Frame::response(kind, inf.to_vec())))
        }
        SupervisoryKind::Ifs => {
            let ifs = Ifs::try_from(inf[0]).ok()?;
            debug!("card set IFS to {}", ifs.as_usize());
            ex.ifs = ifs;
            Some(Outcome::SingleShot(Frame::response(kind, inf.to_vec())))
        }
        SupervisoryKind::Abort => {
            warn!("card aborted the exchange");
            Some(Outcome::Abort(Some(Frame::response(kind, Vec::new()))))
        }
        // Only the interface device may ask for a resync.
        SupervisoryKind::Resync => None,
    }
}

fn on_receive_ready(ex: &mut Exchange<'_, '_>, last_tx: &Frame, nr: Seq) -> Option<Outcome> {
    match last_tx.pcb {
        Pcb::Information { seq, more } => {
            if nr == seq {
                debug!("card asked for I({}) again", seq.as_u8());
                Some(Outcome::Retransmit(last_tx.clone()))
            } else if more {
                ex.seq.host = seq;
                Some(Outcome::Continue(ex.next_information()))
            } else {
                None
            }
        }
        Pcb::ReceiveReady { .. } => Some(Outcome::Retransmit(last_tx.clone())),
        Pcb::Supervisory { .. } => None,
    }
}

fn on_information(
    ex: &mut Exchange<'_, '_>,
    last_tx: &Frame,
    seq: Seq,
    more: bool,
    inf: &[u8],
) -> Option<Outcome> {
    match last_tx.pcb {
        // A chaining card must acknowledge each block with an R-block.
        Pcb::Information { more: true, .. } => return None,
        // The card's I-block implicitly acknowledges ours.
        Pcb::Information { seq: sent, .. } => ex.seq.host = sent,
        Pcb::ReceiveReady { .. } => {}
        Pcb::Supervisory { .. } => return None,
    }
    ex.seq.card = seq;

    let n = ex.deliver(inf);
    if n < inf.len() {
        warn!("RX buffers full: dropped {} bytes", inf.len() - n);
        ex.overflowed = true;
        if more {
            return Some(Outcome::SingleShot(Frame::request(
                SupervisoryKind::Abort,
                Vec::new(),
            )));
        }
        return Some(Outcome::Complete);
    }

    if more {
        Some(Outcome::Continue(Frame::receive_ready(ex.seq.next_card())))
    } else {
        Some(Outcome::Complete)
    }
}
