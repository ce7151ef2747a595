// libese-rs/libese/src/config.rs
//! Protocol and transport configuration

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::utils::default_bwt;

/// Consecutive retransmits of one frame before a resync is requested
pub const MAX_RETRANSMITS: u32 = 3;

/// Consecutive receive errors that force a resync instead of an error R-block
pub const RESYNC_ERROR_THRESHOLD: u32 = 3;

/// Consecutive receive errors that force a hardware reset
pub const RESET_ERROR_THRESHOLD: u32 = 6;

/// Session resets tolerated within one call before a hardware reset
pub const MAX_SESSION_RESETS: u32 = 4;

/// Hardware resets allowed within one call
pub const MAX_DEVICE_RESETS: u32 = 1;

/// Card -> host NAD used by NXP PN80T-family secure elements
pub const DEFAULT_HOST_ADDRESS: u8 = 0xA5;

/// Host -> card NAD used by NXP PN80T-family secure elements
pub const DEFAULT_NODE_ADDRESS: u8 = 0x5A;

/// T=1 link parameters shared by every exchange on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProtocolOptions {
    /// NAD the card uses when talking to us; polled for on receive.
    pub host_address: u8,
    /// NAD placed on every frame we send.
    pub node_address: u8,
    /// Block waiting time before WTX scaling.
    pub bwt: Duration,
}

impl ProtocolOptions {
    /// Set both node addresses.
    pub fn with_addresses(mut self, host_address: u8, node_address: u8) -> Self {
        self.host_address = host_address;
        self.node_address = node_address;
        self
    }

    /// Set the block waiting time.
    pub fn with_bwt(mut self, bwt: Duration) -> Self {
        self.bwt = bwt;
        self
    }
}

impl Default for ProtocolOptions {
    fn default() -> Self {
        Self {
            host_address: DEFAULT_HOST_ADDRESS,
            node_address: DEFAULT_NODE_ADDRESS,
            bwt: default_bwt(),
        }
    }
}

/// Backend-specific open parameters passed through to `Transport::open`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OpenOptions {
    /// Device node, e.g. `/dev/spidev0.0`. Backends may ignore it.
    pub device_path: Option<String>,
    /// Bus clock hint in Hz.
    pub clock_hz: Option<u32>,
}
