// libese-rs/libese/src/session/builder.rs

//! Handle construction.

use crate::config::ProtocolOptions;
use crate::session::handle::{Closed, Ese};
use crate::transport::Transport;
use crate::{Error, Result};

/// Helper to construct an Ese handle with optional configuration.
#[derive(Default)]
pub struct EseBuilder {
    transport: Option<Box<dyn Transport>>,
    options: ProtocolOptions,
}

impl EseBuilder {
    /// Builder without a transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide an already-created transport instance (e.g. MockTransport)
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the default protocol options.
    pub fn with_options(mut self, options: ProtocolOptions) -> Self {
        self.options = options;
        self
    }

    /// Consume the builder and return a closed handle.
    pub fn build(self) -> Result<Ese<Closed>> {
        match self.transport {
            Some(t) => Ok(Ese::with_options(t, self.options)),
            None => Err(Error::InvalidArgument("no transport provided".into())),
        }
    }
}
