//! Encryption provider errors.

use thiserror::Error;

/// Failure to load the public key or to encrypt with it.
///
/// Both are fatal: the client cannot authenticate without an encrypted
/// password, so they surface before any network activity.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The embedded public key could not be decoded.
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    /// RSA encryption failed (e.g. plaintext longer than the key allows).
    #[error("encrypt: {0}")]
    Encrypt(#[from] rsa::Error),
}
