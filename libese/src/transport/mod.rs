// libese-rs/libese/src/transport/mod.rs

//! Links to the secure element.

pub mod mock;
pub mod traits;

pub use mock::{MockTransport, Reply};
pub use traits::{PollStatus, Transport};
