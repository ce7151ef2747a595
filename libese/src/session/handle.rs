// libese-rs/libese/src/session/handle.rs

//! Type-state handle and transceive dispatcher.

use std::marker::PhantomData;

use log::{debug, error};

use crate::config::{OpenOptions, ProtocolOptions};
use crate::protocol::engine;
use crate::transport::Transport;
use crate::types::SequenceState;
use crate::{Error, ErrorCode, ErrorSlot, Result};

/// Type-state marker: transceive unavailable
pub struct Closed;
/// Type-state marker: transceive available
pub struct Open;

/// Secure element handle. Transceive is only available on an opened
/// handle; the T=1 sequence state and the error slot live here and survive
/// across calls.
pub struct Ese<State = Closed> {
    transport: Box<dyn Transport>,
    options: ProtocolOptions,
    sequence: SequenceState,
    error: Option<ErrorSlot>,
    _state: PhantomData<State>,
}

impl<State> Ese<State> {
    /// Backend name, e.g. `"mock"`.
    pub fn name(&self) -> &str {
        self.transport.name()
    }

    /// Protocol options in use.
    pub fn options(&self) -> &ProtocolOptions {
        &self.options
    }

    fn into_state<Next>(self) -> Ese<Next> {
        Ese {
            transport: self.transport,
            options: self.options,
            sequence: self.sequence,
            error: self.error,
            _state: PhantomData,
        }
    }
}

impl Ese<Closed> {
    /// Wrap a transport with default protocol options.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self::with_options(transport, ProtocolOptions::default())
    }

    /// Wrap a transport with explicit protocol options.
    pub fn with_options(transport: Box<dyn Transport>, options: ProtocolOptions) -> Self {
        Self {
            transport,
            options,
            sequence: SequenceState::new(),
            error: None,
            _state: PhantomData,
        }
    }

    /// Open the backend and start a fresh T=1 session. Any error recorded
    /// before the handle was closed is cleared.
    pub fn open(mut self, options: &OpenOptions) -> Result<Ese<Open>> {
        self.transport.open(options)?;
        debug!("opened secure element via {}", self.transport.name());
        self.sequence = SequenceState::new();
        self.error = None;
        Ok(self.into_state())
    }
}

impl Ese<Open> {
    /// Send `tx` and collect the response into `rx`. Returns the number of
    /// bytes written to `rx`.
    pub fn transceive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<usize> {
        self.transceive_scattered(&[tx], &mut [rx])
    }

    /// Scatter-gather variant: `tx` segments are sent as one logical
    /// message and the response is spread across the `rx` segments in
    /// order.
    pub fn transceive_scattered(&mut self, tx: &[&[u8]], rx: &mut [&mut [u8]]) -> Result<usize> {
        // A pending error blocks the handle until it is reopened.
        if self.error.is_some() {
            return Err(Error::Busy);
        }
        if !self.transport.is_open() {
            return Err(self.record(Error::NoTransceive));
        }

        let result = match self.transport.transceive(tx, rx) {
            Some(result) => result,
            None => engine::transceive(
                &mut *self.transport,
                &self.options,
                &mut self.sequence,
                tx,
                rx,
            ),
        };
        result.map_err(|e| self.record(e))
    }

    /// Whether the error slot is set.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Contents of the error slot.
    pub fn error(&self) -> Option<&ErrorSlot> {
        self.error.as_ref()
    }

    /// Tagged code of the recorded error.
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|slot| slot.code)
    }

    /// Message of the recorded error.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|slot| slot.message.as_str())
    }

    /// Current T=1 sequence bits.
    pub fn sequence(&self) -> SequenceState {
        self.sequence
    }

    /// Close the backend. The returned handle can be opened again.
    pub fn close(mut self) -> Result<Ese<Closed>> {
        self.transport.close()?;
        debug!("closed secure element via {}", self.transport.name());
        Ok(self.into_state())
    }

    fn record(&mut self, err: Error) -> Error {
        let code = err.code();
        let message = match code {
            ErrorCode::Backend(index) => self
                .transport
                .error_messages()
                .get(index)
                .copied()
                .unwrap_or("unknown backend error")
                .to_string(),
            ErrorCode::Engine(_) => err.to_string(),
        };
        error!("{}: {}", self.transport.name(), message);
        self.error = Some(ErrorSlot { code, message });
        err
    }
}
