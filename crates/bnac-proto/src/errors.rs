//! Protocol error types.

use thiserror::Error;

/// Result alias for wire format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while parsing a frame into a [`crate::Message`].
///
/// Each structural failure has its own variant so callers can tell a short
/// read from a malformed parameter without matching on strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Frame is not longer than the terminator itself.
    #[error("frame too short: {len} bytes (must exceed {min} bytes)")]
    FrameTooShort {
        /// Length of the rejected frame
        len: usize,
        /// Terminator length the frame must exceed
        min: usize,
    },

    /// Frame, or unterminated buffered data, exceeds the size limit.
    #[error("frame too long: {len} bytes (limit {max})")]
    FrameTooLong {
        /// Bytes buffered (or frame length) when the limit was hit
        len: usize,
        /// Size limit
        max: usize,
    },

    /// Frame does not end with `\r\n\r\n`.
    #[error("frame must end with \\r\\n\\r\\n")]
    MissingTerminator,

    /// Parameter line without a colon, or with an empty parameter name.
    #[error("invalid param line: {line:?}")]
    MalformedParamLine {
        /// The offending line, lossily decoded
        line: String,
    },

    /// The closing blank line is not at the end of the frame.
    #[error("unexpected end of frame at offset {offset} (frame is {len} bytes)")]
    TruncatedMessage {
        /// Offset where parsing stopped
        offset: usize,
        /// Total frame length
        len: usize,
    },

    /// A line is not valid UTF-8.
    #[error("invalid utf-8 in frame: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
