//! Structured messages and their text encoding.

use bytes::{BufMut, Bytes, BytesMut};

use crate::errors::{ProtocolError, Result};

/// Line break used between the name and each parameter.
pub const CRLF: &[u8] = b"\r\n";

/// Frame terminator: the last line break followed by an empty line.
pub const TERMINATOR: &[u8] = b"\r\n\r\n";

/// A single `Key:Value` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name (never empty on the wire)
    pub name: String,
    /// Parameter value (may be empty, may contain colons)
    pub value: String,
}

/// A protocol message: a name plus an ordered list of parameters.
///
/// Parameters keep insertion order and may repeat. Lookup returns the first
/// match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    name: String,
    params: Vec<Param>,
}

impl Message {
    /// Create a message with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), params: Vec::with_capacity(8) }
    }

    /// Builder-style [`Message::put`].
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.put(name, value);
        self
    }

    /// Message name (command keyword or status code).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in insertion order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Append a parameter. Existing parameters with the same name are kept.
    pub fn put(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.push(Param { name: name.into(), value: value.into() });
    }

    /// Value of the first parameter named `name` (case-sensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|p| p.name == name).map(|p| p.value.as_str())
    }

    /// Parse one complete frame.
    ///
    /// The frame must include its terminator. Validation is strict: every
    /// byte between the name line and the closing blank line must belong to a
    /// well-formed parameter line.
    ///
    /// # Errors
    ///
    /// - `FrameTooShort` if `raw` is not longer than the terminator
    /// - `MissingTerminator` if `raw` does not end with `\r\n\r\n`
    /// - `MalformedParamLine` if a parameter line has no colon or starts with
    ///   one
    /// - `TruncatedMessage` if the blank line appears before the end
    /// - `InvalidUtf8` if a name or parameter is not UTF-8
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() <= TERMINATOR.len() {
            return Err(ProtocolError::FrameTooShort { len: raw.len(), min: TERMINATOR.len() });
        }
        if !raw.ends_with(TERMINATOR) {
            return Err(ProtocolError::MissingTerminator);
        }

        // A CRLF always exists: the terminator guarantees it.
        let name_end = find_crlf(raw)
            .ok_or(ProtocolError::TruncatedMessage { offset: 0, len: raw.len() })?;
        let mut message = Self::new(std::str::from_utf8(&raw[..name_end])?);

        let mut pos = name_end + CRLF.len();
        loop {
            let Some(line_len) = find_crlf(&raw[pos..]) else {
                return Err(ProtocolError::TruncatedMessage { offset: pos, len: raw.len() });
            };
            if line_len == 0 {
                break;
            }

            let line = &raw[pos..pos + line_len];
            match line.iter().position(|&b| b == b':') {
                Some(colon) if colon > 0 => {
                    let name = std::str::from_utf8(&line[..colon])?;
                    let value = std::str::from_utf8(&line[colon + 1..])?;
                    message.put(name, value);
                },
                _ => {
                    return Err(ProtocolError::MalformedParamLine {
                        line: String::from_utf8_lossy(line).into_owned(),
                    });
                },
            }

            pos += line_len + CRLF.len();
        }

        // The blank line found above must be the closing one.
        if pos + CRLF.len() != raw.len() {
            return Err(ProtocolError::TruncatedMessage { offset: pos, len: raw.len() });
        }

        Ok(message)
    }

    /// Number of bytes [`Message::encode`] writes.
    pub fn encoded_len(&self) -> usize {
        let params: usize =
            self.params.iter().map(|p| p.name.len() + 1 + p.value.len() + CRLF.len()).sum();
        self.name.len() + CRLF.len() + params + CRLF.len()
    }

    /// Append the wire encoding to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_slice(self.name.as_bytes());
        dst.put_slice(CRLF);
        for param in &self.params {
            dst.put_slice(param.name.as_bytes());
            dst.put_u8(b':');
            dst.put_slice(param.value.as_bytes());
            dst.put_slice(CRLF);
        }
        dst.put_slice(CRLF);
    }

    /// Wire encoding as an owned buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }
}

fn find_crlf(haystack: &[u8]) -> Option<usize> {
    haystack.windows(CRLF.len()).position(|w| w == CRLF)
}
