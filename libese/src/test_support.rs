//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralize common MockTransport setup so tests across the
//! crate and tests/ directory can reuse the same logic.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::config::{OpenOptions, ProtocolOptions};
use crate::protocol::{Frame, Pcb, SupervisoryKind};
use crate::session::{Ese, Open};
use crate::transport::mock::{MockTransport, Reply, Responder};
use crate::transport::{PollStatus, Transport};
use crate::types::Seq;
use crate::utils::ms;
use crate::Result;

/// Transport that delegates into a shared MockTransport so a test can
/// inspect the mock after the handle has taken ownership of the transport.
#[doc(hidden)]
pub struct SharedMock(pub Rc<RefCell<MockTransport>>);

impl Transport for SharedMock {
    fn name(&self) -> &str {
        "mock"
    }
    fn error_messages(&self) -> &[&'static str] {
        crate::transport::mock::MOCK_ERRORS
    }
    fn open(&mut self, options: &OpenOptions) -> Result<()> {
        self.0.borrow_mut().open(options)
    }
    fn close(&mut self) -> Result<()> {
        self.0.borrow_mut().close()
    }
    fn is_open(&self) -> bool {
        self.0.borrow().is_open()
    }
    fn raw_transmit(&mut self, data: &[u8], is_final: bool) -> Result<usize> {
        self.0.borrow_mut().raw_transmit(data, is_final)
    }
    fn raw_receive(&mut self, buf: &mut [u8], is_final: bool) -> Result<usize> {
        self.0.borrow_mut().raw_receive(buf, is_final)
    }
    fn poll(&mut self, expected: u8, timeout: Duration, consume: bool) -> Result<PollStatus> {
        self.0.borrow_mut().poll(expected, timeout, consume)
    }
    fn supports_hardware_reset(&self) -> bool {
        self.0.borrow().supports_hardware_reset()
    }
    fn hardware_reset(&mut self) -> Result<()> {
        self.0.borrow_mut().hardware_reset()
    }
}

/// Protocol options with a short BWT so timeout paths run quickly.
#[doc(hidden)]
pub fn fast_options() -> ProtocolOptions {
    ProtocolOptions::default().with_bwt(ms(10))
}

/// Open a handle on a shared mock and return both.
#[doc(hidden)]
pub fn opened_mock_session(mock: MockTransport) -> Result<(Ese<Open>, Rc<RefCell<MockTransport>>)> {
    let shared = Rc::new(RefCell::new(mock));
    let ese = Ese::with_options(Box::new(SharedMock(shared.clone())), fast_options())
        .open(&OpenOptions::default())?;
    Ok((ese, shared))
}

/// Card I-block reply.
#[doc(hidden)]
pub fn card_i_block(seq: Seq, more: bool, inf: &[u8]) -> Reply {
    Reply::Frame(Frame::information(seq, more, inf.to_vec()))
}

/// Card R-block reply acknowledging up to (but excluding) `seq`.
#[doc(hidden)]
pub fn card_r_block(seq: Seq) -> Reply {
    Reply::Frame(Frame::receive_ready(seq))
}

/// Card supervisory request reply.
#[doc(hidden)]
pub fn card_request(kind: SupervisoryKind, inf: &[u8]) -> Reply {
    Reply::Frame(Frame::request(kind, inf.to_vec()))
}

/// Card supervisory response reply.
#[doc(hidden)]
pub fn card_response(kind: SupervisoryKind, inf: &[u8]) -> Reply {
    Reply::Frame(Frame::response(kind, inf.to_vec()))
}

struct ScriptedCard {
    response: Vec<u8>,
    chunk: usize,
    seq: Seq,
    offset: Option<usize>,
}

impl ScriptedCard {
    fn next_chunk(&mut self) -> Reply {
        let start = self.offset.unwrap_or(0);
        let end = (start + self.chunk).min(self.response.len());
        let more = end < self.response.len();
        self.offset = if more { Some(end) } else { None };
        let frame = Frame::information(self.seq, more, self.response[start..end].to_vec());
        self.seq = self.seq.next();
        Reply::Frame(frame)
    }

    fn answer(&mut self, frame: &Frame) -> Reply {
        match frame.pcb {
            Pcb::Information { seq, more: true } => Reply::Frame(Frame::receive_ready(seq.next())),
            Pcb::Information { more: false, .. } => {
                self.offset = None;
                self.next_chunk()
            }
            Pcb::ReceiveReady { seq, .. } if self.offset.is_some() && seq == self.seq => {
                self.next_chunk()
            }
            Pcb::Supervisory {
                kind: SupervisoryKind::Resync,
                response: false,
            } => {
                self.seq = Seq::ZERO;
                self.offset = None;
                Reply::Frame(Frame::response(SupervisoryKind::Resync, Vec::new()))
            }
            Pcb::Supervisory {
                kind,
                response: false,
            } => Reply::Frame(Frame::response(kind, frame.inf.clone())),
            _ => Reply::Timeout,
        }
    }
}

/// Responder playing a well-behaved card: it acknowledges chained host
/// blocks, answers the last one with `response` split into `chunk`-sized
/// I-blocks, and honours resync requests.
#[doc(hidden)]
pub fn chaining_card(response: Vec<u8>, chunk: usize) -> Responder {
    let mut card = ScriptedCard {
        response,
        chunk: chunk.max(1),
        seq: Seq::ZERO,
        offset: None,
    };
    Box::new(move |frame: &Frame| card.answer(frame))
}
