// libese-rs/libese/src/prelude.rs

//! Commonly used types in one import.

pub use crate::config::{OpenOptions, ProtocolOptions};
pub use crate::protocol::{Frame, Pcb, SupervisoryKind};
pub use crate::session::{Closed, Ese, EseBuilder, Open};
pub use crate::transport::{PollStatus, Transport};
pub use crate::{EngineError, Error, ErrorCode, ErrorSlot, Ifs, Result, Seq, SequenceState};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex, bytes_to_hex_spaced, default_bwt, ms};
