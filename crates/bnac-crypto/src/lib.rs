//! Cryptographic collaborators of the BNAC handshake.
//!
//! Two unrelated operations live here:
//!
//! - [`cipher`]: the password is encrypted with the server's RSA public key
//!   before it goes on the wire. The key is parsed once into an immutable
//!   [`RsaCipher`] and handed to whoever needs to encrypt.
//! - [`token`]: the PUSH step carries an MD5 digest over a fixed template.
//!   It is content addressing the server checks, not a secret.

pub mod cipher;
pub mod error;
pub mod token;

pub use cipher::{PasswordCipher, RsaCipher, SERVER_PUBLIC_KEY_PEM};
pub use error::CipherError;
pub use token::{PUSH_TOKEN_TAG, address_without_port, push_token};
