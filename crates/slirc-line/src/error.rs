//! Error types for line decoding and the framing codecs.

use thiserror::Error;

/// Failure to decode one protocol line into a [`Message`](crate::Message).
///
/// Decoding is deliberately tolerant: only a line with nothing to dispatch
/// on, empty or missing its command token, is an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The line was empty.
    #[error("empty line")]
    Empty,

    /// The line contained no command token.
    #[error("no command token in line {0:?}")]
    MissingCommand(String),
}

/// Errors produced by the framing codecs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// An I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line exceeded the maximum frame length.
    #[error("line too long: {actual} bytes (limit {limit})")]
    LineTooLong {
        /// Observed length in bytes, terminator included.
        actual: usize,
        /// Configured frame limit.
        limit: usize,
    },

    /// A frame was not valid UTF-8.
    #[error("invalid UTF-8 at byte {byte_pos}: {details}")]
    InvalidUtf8 {
        /// Offset of the first invalid byte.
        byte_pos: usize,
        /// Description from the UTF-8 validator.
        details: String,
    },

    /// A frame decoded as text but was not a valid message.
    #[error("invalid message {line:?}")]
    Invalid {
        /// The offending line.
        line: String,
        /// The underlying decode failure.
        #[source]
        source: DecodeError,
    },
}

/// Convenience result alias for protocol operations.
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

// ============================================================================
// Tests
// ============================================================================
