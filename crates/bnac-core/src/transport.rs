//! Transport plumbing.
//!
//! The handshake runs over any `AsyncRead + AsyncWrite` stream; the
//! [`FrameReader`] turns its read half into frames. Keepalives go over
//! datagrams, abstracted by [`DatagramTransport`] so production uses tokio
//! UDP sockets, simulation uses turmoil, and unit tests inject failures.

use std::io;

use async_trait::async_trait;
use bnac_proto::{Message, MessageFramer, ProtocolError};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const READ_CHUNK: usize = 4096;

/// Reads complete frames from a byte stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    framer: MessageFramer,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner, framer: MessageFramer::new() }
    }

    /// Wait for the next frame.
    ///
    /// Blocks until a terminator arrives; there is no deadline. At end of
    /// stream, unterminated leftovers come back as a final frame and `None`
    /// follows.
    ///
    /// # Errors
    ///
    /// Read failures, and `InvalidData` wrapping
    /// [`ProtocolError::FrameTooLong`] once more than [`MAX_FRAME_LEN`] bytes
    /// arrive without a terminator.
    ///
    /// [`MAX_FRAME_LEN`]: bnac_proto::MAX_FRAME_LEN
    pub async fn read_frame(&mut self) -> io::Result<Option<Bytes>> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let next = self.framer.next_frame().map_err(invalid_data)?;
            if let Some(frame) = next {
                return Ok(Some(frame));
            }
            if self.framer.is_finished() {
                return Ok(None);
            }

            let n = self.inner.read(&mut chunk).await?;
            if n == 0 {
                self.framer.finish();
            } else {
                self.framer.extend(&chunk[..n]);
            }
        }
    }

    /// Give back the underlying reader. Buffered bytes are lost.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Serialize `message` and flush it to `writer`.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &Message,
) -> io::Result<()> {
    writer.write_all(&message.to_bytes()).await?;
    writer.flush().await
}

/// Opens one fresh datagram socket per keepalive.
#[async_trait]
pub trait DatagramTransport: Send + Sync + 'static {
    /// Socket type; closed when dropped.
    type Socket: DatagramSocket;

    /// Open a socket connected to the server endpoint.
    async fn open(&self) -> io::Result<Self::Socket>;
}

/// A connected datagram socket.
#[async_trait]
pub trait DatagramSocket: Send + Sync + 'static {
    /// Send one datagram to the connected peer, returning bytes sent.
    async fn send(&self, datagram: &[u8]) -> io::Result<usize>;
}

fn invalid_data(e: ProtocolError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}
