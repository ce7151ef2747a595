// libese-rs/libese/src/transport/mock.rs

//! Scripted card for tests.

use std::collections::VecDeque;
use std::time::Duration;

use crate::config::{DEFAULT_HOST_ADDRESS, OpenOptions};
use crate::protocol::Frame;
use crate::transport::traits::{PollStatus, Transport};
use crate::{Error, Result};

/// One scripted card answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A well-formed frame; the NAD is filled in with the host address.
    Frame(Frame),
    /// Raw bytes starting at the NAD, e.g. a corrupted frame.
    Raw(Vec<u8>),
    /// The card stays silent for the whole poll.
    Timeout,
    /// `poll` fails with `Error::Backend(index)`.
    PollError(usize),
}

/// Answers computed from the last frame the host wrote.
pub type Responder = Box<dyn FnMut(&Frame) -> Reply>;

/// Mock transport for unit tests. It plays the card side of the link: it
/// records every frame written and answers from a queue of replies, falling
/// back to an optional responder closure once the queue is empty.
pub struct MockTransport {
    /// Every frame written, as raw bytes
    pub sent: Vec<Vec<u8>>,
    /// Answers served before the responder
    pub replies: VecDeque<Reply>,
    /// NAD put on scripted frames
    pub host_address: u8,
    /// Timeouts passed to `poll`, in call order
    pub poll_timeouts: Vec<Duration>,
    /// Calls to `hardware_reset`
    pub hardware_resets: usize,
    /// Whether `hardware_reset` is supported
    pub reset_capable: bool,
    /// Testing hook: make `hardware_reset` fail
    pub reset_fails: bool,
    /// Set by `open`, cleared by `close`
    pub is_open: bool,
    /// Testing hook: accept at most this many bytes per `raw_transmit`
    pub max_write: Option<usize>,
    responder: Option<Responder>,
    pending_tx: Vec<u8>,
    pending_rx: VecDeque<u8>,
}

/// Backend error table for the mock
pub const MOCK_ERRORS: &[&str] = &["mock link failure", "mock reset failure"];

impl MockTransport {
    /// Closed mock with an empty script.
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            replies: VecDeque::new(),
            host_address: DEFAULT_HOST_ADDRESS,
            poll_timeouts: Vec::new(),
            hardware_resets: 0,
            reset_capable: true,
            reset_fails: false,
            is_open: false,
            max_write: None,
            responder: None,
            pending_tx: Vec::new(),
            pending_rx: VecDeque::new(),
        }
    }

    /// Queue one answer.
    pub fn push_reply(&mut self, reply: Reply) {
        self.replies.push_back(reply);
    }

    /// Answer from `responder` once the queue is empty.
    pub fn set_responder(&mut self, responder: Responder) {
        self.responder = Some(responder);
    }

    /// Decode every frame written so far. Frames that fail to decode are
    /// skipped.
    pub fn sent_frames(&self) -> Vec<Frame> {
        self.sent
            .iter()
            .filter_map(|raw| Frame::decode(raw).ok())
            .collect()
    }

    fn next_reply(&mut self) -> Reply {
        if let Some(reply) = self.replies.pop_front() {
            return reply;
        }
        let last = self.sent.last().and_then(|raw| Frame::decode(raw).ok());
        match (self.responder.as_mut(), last) {
            (Some(responder), Some(frame)) => responder(&frame),
            _ => Reply::Timeout,
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    fn error_messages(&self) -> &[&'static str] {
        MOCK_ERRORS
    }

    fn open(&mut self, _options: &OpenOptions) -> Result<()> {
        self.is_open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.is_open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn raw_transmit(&mut self, data: &[u8], is_final: bool) -> Result<usize> {
        let n = self.max_write.map_or(data.len(), |max| max.min(data.len()));
        self.pending_tx.extend_from_slice(&data[..n]);
        if is_final {
            self.sent.push(std::mem::take(&mut self.pending_tx));
        }
        Ok(n)
    }

    fn raw_receive(&mut self, buf: &mut [u8], is_final: bool) -> Result<usize> {
        let n = buf.len().min(self.pending_rx.len());
        for (slot, b) in buf.iter_mut().zip(self.pending_rx.drain(..n)) {
            *slot = b;
        }
        if is_final {
            self.pending_rx.clear();
        }
        Ok(n)
    }

    fn poll(&mut self, expected: u8, timeout: Duration, consume: bool) -> Result<PollStatus> {
        self.poll_timeouts.push(timeout);
        let bytes = match self.next_reply() {
            Reply::Timeout => return Ok(PollStatus::NotMatched),
            Reply::PollError(index) => return Err(Error::Backend(index)),
            Reply::Raw(bytes) => bytes,
            Reply::Frame(mut frame) => {
                frame.nad = self.host_address;
                frame.encode()?
            }
        };

        self.pending_rx = bytes.into_iter().collect();
        if self.pending_rx.front() != Some(&expected) {
            // A real link would keep discarding bytes until the timeout
            self.pending_rx.clear();
            return Ok(PollStatus::NotMatched);
        }
        if consume {
            self.pending_rx.pop_front();
        }
        Ok(PollStatus::Matched { consumed: consume })
    }

    fn supports_hardware_reset(&self) -> bool {
        self.reset_capable
    }

    fn hardware_reset(&mut self) -> Result<()> {
        if !self.reset_capable {
            return Err(Error::UnsupportedOperation("hardware reset".into()));
        }
        self.hardware_resets += 1;
        if self.reset_fails {
            return Err(Error::Backend(1));
        }
        Ok(())
    }
}
