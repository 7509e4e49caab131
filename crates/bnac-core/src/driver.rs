//! Async handshake driver.
//!
//! Executes [`HandshakeAction`]s over a stream: each `Send` is written and
//! flushed, then the driver waits for exactly one response frame before
//! feeding it back into the state machine. Steps never overlap.

use std::io;

use bnac_proto::{Message, ProtocolError};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::{
    error::HandshakeError,
    handshake::{Handshake, HandshakeAction, HandshakeState},
    session::Session,
    transport::{FrameReader, write_message},
};

/// Run `handshake` to completion over `stream`.
///
/// On success the stream is shut down and the session returned; the
/// connection is not reused. On failure the stream is dropped. Reads have no
/// deadline, so a silent server stalls this future.
///
/// # Errors
///
/// Any [`HandshakeError`]: I/O failure, malformed frame, server hang-up, or
/// a protocol deviation reported by the state machine.
pub async fn perform_handshake<S>(
    stream: S,
    mut handshake: Handshake,
) -> Result<Session, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = FrameReader::new(reader);
    let mut actions = handshake.start()?;

    loop {
        for action in actions {
            match action {
                HandshakeAction::Send(request) => {
                    debug!(command = request.name(), "sending request");
                    write_message(&mut writer, &request).await?;
                },
                HandshakeAction::Complete(session) => {
                    info!("handshake complete");
                    if let Err(e) = writer.shutdown().await {
                        debug!(error = %e, "handshake connection shutdown failed");
                    }
                    return Ok(session);
                },
            }
        }

        let Some(step) = handshake.current_step() else {
            return Err(HandshakeError::InvalidState {
                state: handshake.state(),
                operation: "await_response",
            });
        };

        let frame = reader
            .read_frame()
            .await
            .map_err(read_error)?
            .ok_or(HandshakeError::ConnectionClosed { step })?;
        debug!(%step, bytes = frame.len(), "received response");

        let response = Message::parse(&frame)?;
        actions = handshake.handle_response(&response)?;

        if let HandshakeState::Awaiting(next) = handshake.state() {
            info!(%step, %next, "handshake step complete");
        }
    }
}

/// Framing errors travel inside `io::Error`; surface them as protocol errors.
fn read_error(e: io::Error) -> HandshakeError {
    match e.get_ref().and_then(|inner| inner.downcast_ref::<ProtocolError>()) {
        Some(protocol) => HandshakeError::Protocol(protocol.clone()),
        None => HandshakeError::Io(e),
    }
}
