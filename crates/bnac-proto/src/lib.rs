//! Wire format for the BNAC authorization protocol.
//!
//! Messages are plain text. The first line carries the message name (a
//! command keyword such as `AUTH` or a numeric status such as `288`), each
//! following line carries one `Key:Value` parameter, and an empty line closes
//! the message:
//!
//! ```text
//! 288\r\n
//! SESSION_ID:abc\r\n
//! ROLE:user\r\n
//! \r\n
//! ```
//!
//! The closing `\r\n\r\n` doubles as the frame delimiter on stream
//! transports, so [`MessageFramer`] only has to search for it to cut a byte
//! stream into frames. [`Message::parse`] then validates the frame structure
//! strictly. There is no length prefix and no escaping, so names and values
//! must never contain `\r\n` and parameter names must not start with `:`.
//! Frames are capped at [`MAX_FRAME_LEN`] bytes.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod framer;
pub mod message;

pub use errors::{ProtocolError, Result};
pub use framer::{MAX_FRAME_LEN, MessageFramer};
pub use message::{CRLF, Message, Param, TERMINATOR};
