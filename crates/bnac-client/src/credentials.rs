//! Password input and encryption.

use bnac_core::handshake::Credentials;
use bnac_crypto::{CipherError, PasswordCipher};

use crate::error::ClientError;

/// Prompt shown before masked password entry.
pub const PASSWORD_PROMPT: &str = "Password: ";

/// Use `password` if given, otherwise read it from the terminal without echo.
pub fn resolve_password(password: Option<String>) -> Result<String, ClientError> {
    match password {
        Some(password) => Ok(password),
        None => rpassword::prompt_password(PASSWORD_PROMPT).map_err(ClientError::Password),
    }
}

/// Encrypt `password` for the AUTH request.
pub fn seal(
    user: &str,
    password: &str,
    cipher: &dyn PasswordCipher,
) -> Result<Credentials, CipherError> {
    Ok(Credentials {
        user: user.to_string(),
        encrypted_password: cipher.encrypt(password.as_bytes())?,
    })
}
