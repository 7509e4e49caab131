//! Error types for the handshake and heartbeat phases.

use std::io;

use bnac_proto::ProtocolError;
use thiserror::Error;

use crate::handshake::{HandshakeState, HandshakeStep};

/// Fatal handshake failure.
///
/// The protocol has no recovery path: any of these ends the handshake and
/// the connection is dropped.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// Server answered with a status other than the one the step expects.
    #[error("[{step}] bad response code: {actual} (expected {expected})")]
    UnexpectedResponse {
        /// Step that received the response
        step: HandshakeStep,
        /// Status the step requires
        expected: &'static str,
        /// Status the server sent
        actual: String,
    },

    /// Response lacks a parameter the step must extract.
    #[error("[{step}] {field} is not found in response")]
    MissingField {
        /// Step that received the response
        step: HandshakeStep,
        /// Missing parameter name
        field: &'static str,
    },

    /// Operation not valid in the current state.
    #[error("invalid state {state:?} for operation: {operation}")]
    InvalidState {
        /// State the machine was in
        state: HandshakeState,
        /// Rejected operation
        operation: &'static str,
    },

    /// Server closed the connection before the step's response arrived.
    #[error("[{step}] connection closed before response")]
    ConnectionClosed {
        /// Step waiting for a response
        step: HandshakeStep,
    },

    /// Response frame failed to parse.
    #[error("malformed response: {0}")]
    Protocol(#[from] ProtocolError),

    /// Connection-level I/O failure.
    #[error("connection error: {0}")]
    Io(#[from] io::Error),
}

/// Failure to deliver one keepalive.
///
/// Never fatal: the runner reports it and moves on to the next tick.
#[derive(Debug, Error)]
pub enum HeartbeatError {
    /// Socket could not be opened or connected.
    #[error("failed to connect to server for heartbeat: {0}")]
    Connect(#[source] io::Error),

    /// Datagram could not be sent.
    #[error("failed to send heartbeat: {0}")]
    Send(#[source] io::Error),

    /// Socket accepted only part of the datagram.
    #[error("heartbeat truncated: sent {sent} of {len} bytes")]
    ShortWrite {
        /// Bytes the socket reported as sent
        sent: usize,
        /// Datagram size
        len: usize,
    },
}
