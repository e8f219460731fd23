//! Stream Engine Error Types
//!
//! Two failure classes exist on the delivery path (RFC 9000 Section 20 gives
//! the codes the connection layer reports for them):
//! - **Resource exhaustion**: the frame-chain pool cannot hand out another
//!   record. Fatal to the operation in progress; the caller decides the
//!   connection's fate, normally closure with INTERNAL_ERROR.
//! - **Peer protocol errors**: inbound data that contradicts a known final
//!   size.
//!
//! Precondition breaches by the embedding connection layer (out-of-order push,
//! watermark regression) are programming errors and are checked with debug
//! assertions rather than surfaced here.

use thiserror::Error;

/// Transport Error Codes used by this engine (RFC 9000 Section 20.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum TransportError {
    /// Internal Error (0x01) - Implementation error, including exhaustion
    InternalError = 0x01,

    /// Final Size Error (0x06) - Final size violation
    FinalSizeError = 0x06,
}

/// Result type for stream engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the stream delivery engine.
#[derive(Error, Debug)]
pub enum Error {
    /// The frame-chain pool has no free record.
    ///
    /// The operation that hit this left every queue exactly as it was.
    #[error("frame chain pool exhausted: {capacity} records in use")]
    PoolExhausted { capacity: usize },

    /// A chain was requested with more spans than a STREAM frame may carry.
    #[error("chain needs {count} spans, limit is {max}")]
    TooManySpans { count: usize, max: usize },

    /// Received data extends beyond the stream's final size.
    #[error("data ending at {end} exceeds final size {final_size}")]
    FinalSize { end: u64, final_size: u64 },

    /// A qlog record could not be serialized.
    #[error("qlog serialization failed: {0}")]
    Qlog(#[from] serde_json::Error),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns true for resource errors the connection cannot recover from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::PoolExhausted { .. } | Error::TooManySpans { .. })
    }

    /// Returns the transport error code the connection layer should close with.
    pub fn transport_error(&self) -> TransportError {
        match self {
            Error::FinalSize { .. } => TransportError::FinalSizeError,
            _ => TransportError::InternalError,
        }
    }
}
