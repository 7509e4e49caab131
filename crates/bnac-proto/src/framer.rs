//! Incremental frame extraction from a byte stream.
//!
//! Stream transports deliver bytes in arbitrary chunks. [`MessageFramer`]
//! buffers them and cuts a frame every time the terminator shows up. It does
//! not validate anything beyond the terminator; that is [`Message::parse`]'s
//! job.
//!
//! Once the stream has ended ([`MessageFramer::finish`]), leftover bytes are
//! handed out as one last frame even without a terminator. The parser then
//! rejects them with a precise error instead of the framer silently dropping
//! them.
//!
//! A frame may be at most [`MAX_FRAME_LEN`] bytes, terminator included. Once
//! the buffer exceeds that without a terminator the framer reports
//! [`ProtocolError::FrameTooLong`] and discards what it holds; the stream
//! cannot be resynchronized and should be abandoned.
//!
//! [`Message::parse`]: crate::Message::parse

use bytes::{Bytes, BytesMut};

use crate::{
    errors::{ProtocolError, Result},
    message::TERMINATOR,
};

/// Largest accepted frame, terminator included.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Buffering splitter that turns a byte stream into frames.
#[derive(Debug, Default)]
pub struct MessageFramer {
    buffer: BytesMut,
    /// Prefix of `buffer` already known to hold no terminator
    scanned: usize,
    finished: bool,
}

impl MessageFramer {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes received from the transport.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Mark the end of the stream.
    ///
    /// After this, [`MessageFramer::next_frame`] flushes any remaining bytes
    /// as a final frame.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Whether [`MessageFramer::finish`] has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of buffered bytes not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Take the next frame, if one is available.
    ///
    /// Returns `None` when more data is needed, or when the stream has
    /// finished and the buffer is empty. Calling again after more data arrives
    /// resumes where the previous call left off.
    ///
    /// # Errors
    ///
    /// `FrameTooLong` if the pending frame exceeds [`MAX_FRAME_LEN`]. The
    /// buffered bytes are dropped.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        // A terminator may straddle the previous scan boundary.
        let start = self.scanned.saturating_sub(TERMINATOR.len() - 1);

        if let Some(offset) = find_terminator(&self.buffer[start..]) {
            let end = start + offset + TERMINATOR.len();
            if end > MAX_FRAME_LEN {
                return Err(self.overflow(end));
            }
            self.scanned = 0;
            return Ok(Some(self.buffer.split_to(end).freeze()));
        }
        if self.buffer.len() > MAX_FRAME_LEN {
            return Err(self.overflow(self.buffer.len()));
        }
        self.scanned = self.buffer.len();

        if self.finished && !self.buffer.is_empty() {
            self.scanned = 0;
            return Ok(Some(self.buffer.split().freeze()));
        }

        Ok(None)
    }

    /// Iterate over every frame available right now.
    ///
    /// Stops after the first error.
    pub fn frames(&mut self) -> impl Iterator<Item = Result<Bytes>> + '_ {
        std::iter::from_fn(move || self.next_frame().transpose())
    }

    fn overflow(&mut self, len: usize) -> ProtocolError {
        self.buffer.clear();
        self.scanned = 0;
        ProtocolError::FrameTooLong { len, max: MAX_FRAME_LEN }
    }
}

fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack.windows(TERMINATOR.len()).position(|w| w == TERMINATOR)
}
