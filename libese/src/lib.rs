// libese-rs/libese/src/lib.rs

//! libese
//!
//! Pure Rust ISO/IEC 7816-3 T=1 protocol engine for embedded secure
//! elements reached over a byte-oriented link (SPI, I2C, UART).
#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod error;
pub mod prelude;
pub mod protocol;
pub mod session;
pub mod test_support;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the sequence types in `types` are available for consumers and for
// convenient `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
