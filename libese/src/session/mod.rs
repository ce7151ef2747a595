// libese-rs/libese/src/session/mod.rs

//! Secure element handles.

pub mod builder;
pub mod handle;

pub use builder::EseBuilder;
pub use handle::{Closed, Ese, Open};
