// libese-rs/libese/src/protocol/engine.rs

//! T=1 transceive loop: transmit, receive, evaluate, escalate.

use log::{debug, error, warn};

use crate::config::{MAX_DEVICE_RESETS, MAX_RETRANSMITS, MAX_SESSION_RESETS, ProtocolOptions};
use crate::constants::{T1_HEADER_LEN, T1_INVALID_LEN, T1_LRC_LEN, T1_MAX_FRAME_LEN};
use crate::protocol::exchange::Exchange;
use crate::protocol::frame::Frame;
use crate::protocol::pcb::SupervisoryKind;
use crate::protocol::rules::{self, Outcome, Received};
use crate::transport::{PollStatus, Transport};
use crate::types::SequenceState;
use crate::utils::scaled_bwt;
use crate::{Error, Result};

/// Run one request/response exchange over `transport`. Returns the number
/// of RX bytes written. A response that does not fit `rx` is an error.
pub fn transceive<T: Transport + ?Sized>(
    transport: &mut T,
    options: &ProtocolOptions,
    seq: &mut SequenceState,
    tx: &[&[u8]],
    rx: &mut [&mut [u8]],
) -> Result<usize> {
    let mut ex = Exchange::new(seq, tx, rx);
    let mut last_tx = ex.next_information();
    let mut on_wire = last_tx.clone();
    let mut session_resets = 0u32;
    let mut device_resets = 0u32;

    loop {
        transmit(transport, options, &on_wire)?;
        let received = receive(transport, options, &mut ex)?;

        match rules::evaluate(&mut ex, &last_tx, &on_wire, received) {
            Outcome::Complete if ex.overflowed => {
                error!("response exceeded the {} byte RX buffers", ex.received());
                return Err(Error::CommFailure(format!(
                    "receive buffer overflow after {} bytes",
                    ex.received()
                )));
            }
            Outcome::Complete => {
                debug!("exchange complete: {} bytes received", ex.received());
                return Ok(ex.received());
            }
            Outcome::Continue(next) => {
                ex.retransmits = 0;
                ex.errors = 0;
                last_tx = next.clone();
                on_wire = next;
            }
            Outcome::SingleShot(frame) => on_wire = frame,
            Outcome::Retransmit(frame) => {
                ex.retransmits += 1;
                if ex.retransmits <= MAX_RETRANSMITS {
                    on_wire = frame;
                    continue;
                }
                if frame.pcb.is_request(SupervisoryKind::Resync) {
                    let reason = ex.describe("resync not acknowledged");
                    error!("{} after {} retransmits", reason, MAX_RETRANSMITS);
                    return Err(Error::HardFail(reason));
                }
                warn!("{} retransmitted {} times; requesting resync", frame.pcb, MAX_RETRANSMITS);
                ex.retransmits = 0;
                on_wire = Frame::request(SupervisoryKind::Resync, Vec::new());
            }
            Outcome::ResetSession => {
                session_resets += 1;
                debug!("session resynchronized ({} this call)", session_resets);
                if session_resets > MAX_SESSION_RESETS {
                    warn!("{} session resets without progress", session_resets);
                    reset_device(transport, &mut device_resets, &ex)?;
                    session_resets = 0;
                }
                ex.reset();
                last_tx = ex.next_information();
                on_wire = last_tx.clone();
            }
            Outcome::ResetDevice => {
                reset_device(transport, &mut device_resets, &ex)?;
                session_resets = 0;
                ex.reset();
                last_tx = ex.next_information();
                on_wire = last_tx.clone();
            }
            Outcome::Abort(reply) => {
                if let Some(frame) = reply {
                    transmit(transport, options, &frame)?;
                }
                return Err(Error::Abort);
            }
        }
    }
}

fn reset_device<T: Transport + ?Sized>(
    transport: &mut T,
    device_resets: &mut u32,
    ex: &Exchange<'_, '_>,
) -> Result<()> {
    if *device_resets >= MAX_DEVICE_RESETS {
        error!("hardware reset already attempted during this exchange");
        return Err(Error::DeviceReset(ex.describe("reset budget exhausted")));
    }
    if !transport.supports_hardware_reset() {
        error!("{} cannot reset the secure element", transport.name());
        return Err(Error::DeviceReset(ex.describe("no hardware reset available")));
    }
    *device_resets += 1;
    warn!("resetting secure element via {}", transport.name());
    transport
        .hardware_reset()
        .map_err(|e| Error::DeviceReset(format!("hardware reset failed: {}", e)))
}

/// Write one frame with the node address applied and the LRC recomputed.
pub fn transmit<T: Transport + ?Sized>(
    transport: &mut T,
    options: &ProtocolOptions,
    frame: &Frame,
) -> Result<()> {
    let mut frame = frame.clone();
    frame.nad = options.node_address;
    transport.before_transmit(&mut frame);
    let wire = frame.encode()?;

    debug!("TX {} len={}", frame.pcb, frame.inf.len());
    #[cfg(feature = "diagnostics")]
    log::trace!("TX {}", frame.trace());

    // One write per frame: `is_final` releases the bus afterwards.
    let sent = transport.raw_transmit(&wire, true)?;
    if sent != wire.len() {
        return Err(Error::CommFailure(format!(
            "short write: {} of {} bytes",
            sent,
            wire.len()
        )));
    }
    Ok(())
}

/// Wait for and read one card frame. Link problems that the protocol can
/// recover from come back as `Received::Invalid`; only backend failures
/// are returned as errors.
pub(crate) fn receive<T: Transport + ?Sized>(
    transport: &mut T,
    options: &ProtocolOptions,
    ex: &mut Exchange<'_, '_>,
) -> Result<Received> {
    let timeout = scaled_bwt(options.bwt, ex.wait_mult);
    ex.wait_mult = 1;

    let consumed = match transport.poll(options.host_address, timeout, true)? {
        PollStatus::NotMatched => {
            debug!("RX timeout after {:?}", timeout);
            return Ok(Received::timeout());
        }
        PollStatus::Matched { consumed } => consumed,
    };

    let mut header = [0u8; T1_HEADER_LEN];
    header[0] = options.host_address;
    let start = if consumed { 1 } else { 0 };
    let want = T1_HEADER_LEN - start;
    if read_exact(transport, &mut header[start..], false)? < want {
        transport.raw_receive(&mut [], true)?;
        return Ok(Received::Invalid {
            parity: false,
            reason: "short header".into(),
        });
    }

    if header[2] == T1_INVALID_LEN {
        transport.raw_receive(&mut [], true)?;
        return Ok(Received::Invalid {
            parity: false,
            reason: "reserved length 0xff".into(),
        });
    }

    let body_len = header[2] as usize + T1_LRC_LEN;
    let mut wire = Vec::with_capacity(T1_MAX_FRAME_LEN);
    wire.extend_from_slice(&header);
    wire.resize(T1_HEADER_LEN + body_len, 0);
    let got = read_exact(transport, &mut wire[T1_HEADER_LEN..], true)?;
    wire.truncate(T1_HEADER_LEN + got);

    match Frame::decode(&wire) {
        Ok(mut frame) => {
            transport.after_receive(&mut frame);
            debug!("RX {} len={}", frame.pcb, frame.inf.len());
            #[cfg(feature = "diagnostics")]
            log::trace!("RX {}", frame.trace());
            Ok(Received::Frame(frame))
        }
        Err(Error::ChecksumMismatch { expected, actual }) => Ok(Received::Invalid {
            parity: true,
            reason: format!("LRC mismatch: expected {:#04x}, got {:#04x}", expected, actual),
        }),
        Err(e) => Ok(Received::Invalid {
            parity: false,
            reason: e.to_string(),
        }),
    }
}

/// Keep reading until `buf` is full or the backend returns nothing.
fn read_exact<T: Transport + ?Sized>(transport: &mut T, buf: &mut [u8], is_final: bool) -> Result<usize> {
    let mut got = 0usize;
    while got < buf.len() {
        let n = transport.raw_receive(&mut buf[got..], is_final)?;
        if n == 0 {
            break;
        }
        got += n;
    }
    Ok(got)
}
