// libese-rs/libese/src/protocol/mod.rs

//! T=1 block protocol: frame codec, rule table and the transceive loop.

pub mod checksum;
pub mod engine;
pub(crate) mod exchange;
pub mod frame;
pub mod pcb;
pub(crate) mod rules;

pub use checksum::lrc;
pub use engine::transceive;
pub use frame::Frame;
pub use pcb::{Pcb, SupervisoryKind};
