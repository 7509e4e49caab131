//! Top-level client error.

use std::io;

use bnac_core::HandshakeError;
use bnac_crypto::CipherError;
use thiserror::Error;

/// Anything that ends the process with a failure status.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Public key could not be loaded or the password not encrypted.
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// Password could not be read from the terminal.
    #[error("get password: {0}")]
    Password(#[source] io::Error),

    /// TCP connection to the server failed.
    #[error("dial to server: {0}")]
    Connect(#[source] io::Error),

    /// Handshake rejected or broken.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// Other I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
