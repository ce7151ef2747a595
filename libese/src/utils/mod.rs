//! Utilities for libese: small, reusable helpers used across the crate.
//!
//! Hex rendering for frame traces, BWT arithmetic, and scatter-gather
//! helpers over the caller's TX/RX segments.

pub mod hex;
pub mod sg;
pub mod timeout;

pub use hex::*;
pub use sg::*;
pub use timeout::*;
