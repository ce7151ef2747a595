// libese-rs/libese/src/error.rs

//! Crate error type and the tagged codes kept in a handle's error slot.

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller passed something unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The handle already carries an error from a previous call.
    #[error("handle is in an error state")]
    Busy,

    /// Failure reported by the hardware backend. The index refers to the
    /// backend's `Transport::error_messages` table.
    #[error("backend error #{0}")]
    Backend(usize),

    /// Frame or INF size out of range.
    #[error("invalid frame length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Length the frame format calls for
        expected: usize,
        /// Length actually seen
        actual: usize,
    },

    /// LRC did not match the frame contents.
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch {
        /// LRC computed over the received bytes
        expected: u8,
        /// LRC byte carried by the frame
        actual: u8,
    },

    /// Malformed PCB, reserved LEN or bad supervisory INF.
    #[error("frame format error: {0}")]
    FrameFormat(String),

    /// Optional backend capability is missing.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The backend link is not usable.
    #[error("no transceive available")]
    NoTransceive,

    /// The exchange could not deliver the message intact.
    #[error("communication failure: {0}")]
    CommFailure(String),

    /// Recovery budget exhausted or no rule applied.
    #[error("T=1 hard failure: {0}")]
    HardFail(String),

    /// The card aborted the chain.
    #[error("exchange aborted by the card")]
    Abort,

    /// A hardware reset was needed but unavailable, failed or already used.
    #[error("device reset failed: {0}")]
    DeviceReset(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Engine-wide error kinds stored in a handle's error slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum EngineError {
    /// See [`Error::InvalidArgument`].
    #[display(fmt = "invalid argument")]
    InvalidArgument,
    /// See [`Error::Busy`].
    #[display(fmt = "handle busy")]
    Busy,
    /// See [`Error::NoTransceive`].
    #[display(fmt = "no transceive available")]
    NoTransceive,
    /// Frame-level failures and [`Error::CommFailure`].
    #[display(fmt = "communication failure")]
    CommFailure,
    /// See [`Error::HardFail`].
    #[display(fmt = "hard failure")]
    HardFail,
    /// See [`Error::Abort`].
    #[display(fmt = "aborted")]
    Abort,
    /// See [`Error::DeviceReset`].
    #[display(fmt = "device reset failed")]
    DeviceReset,
}

/// Tagged error code: either an engine-wide kind or an index into the
/// backend's error table. The two spaces never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Engine-wide kind.
    Engine(EngineError),
    /// Index into `Transport::error_messages`.
    Backend(usize),
}

/// Single error slot kept per open handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSlot {
    /// What went wrong.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}

impl Error {
    /// Map this error onto the tagged code space used by the error slot.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Backend(index) => ErrorCode::Backend(*index),
            Error::InvalidArgument(_) | Error::UnsupportedOperation(_) => {
                ErrorCode::Engine(EngineError::InvalidArgument)
            }
            Error::Busy => ErrorCode::Engine(EngineError::Busy),
            Error::NoTransceive => ErrorCode::Engine(EngineError::NoTransceive),
            Error::InvalidLength { .. }
            | Error::ChecksumMismatch { .. }
            | Error::FrameFormat(_)
            | Error::CommFailure(_) => ErrorCode::Engine(EngineError::CommFailure),
            Error::HardFail(_) => ErrorCode::Engine(EngineError::HardFail),
            Error::Abort => ErrorCode::Engine(EngineError::Abort),
            Error::DeviceReset(_) => ErrorCode::Engine(EngineError::DeviceReset),
        }
    }
}
