//! Password encryption provider.

use rsa::{Pkcs1v15Encrypt, RsaPublicKey, pkcs8::DecodePublicKey, traits::PublicKeyParts};

use crate::error::CipherError;

/// Public key of the BNAC server, PEM-encoded `SubjectPublicKeyInfo`.
pub const SERVER_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEArM43Q1ctTQ8pHp5dW8xk
Fm5hieEzm92MBx6M1uVf8Va3Qrt5rLcXK+YbFUyN/oAFB5hopx0QbWOM2hiohvxp
I+HB6rh5p/Q/Ywmm1tA3T/GdvttzFjhAyDnnTiY/O61m+hoEivavDcxLtkZ4dNy/
n1feI7zDc61LP40S+AG5+Qby6HyNetkWC8h01FwW8Hm3CY6vfEDJ3HPsqDKMnUaX
/PqoKv8f2sUFl/mcQz18LH0JNwND4qNUqI+BqpNKJsutpkOB6dGA9dXQtTGc2bzo
5IPxGsSrxJS01TSjqPoASoRj8YKVISJHHwkVbun+r5wx5OLtEFcMxxh3LELgIWDk
aQIDAQAB
-----END PUBLIC KEY-----";

/// Encrypts the password before it is sent in the AUTH request.
pub trait PasswordCipher: Send + Sync {
    /// Encrypt `plaintext` and return the ciphertext hex-encoded (lowercase).
    fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError>;
}

/// RSA PKCS#1 v1.5 encryption with a fixed public key.
///
/// Build it once at startup and pass it by reference. Every call uses fresh
/// random padding, so encrypting the same password twice gives different
/// ciphertexts.
#[derive(Debug, Clone)]
pub struct RsaCipher {
    key: RsaPublicKey,
}

impl RsaCipher {
    /// Wrap an already decoded key.
    pub fn new(key: RsaPublicKey) -> Self {
        Self { key }
    }

    /// Decode a PEM `PUBLIC KEY` block.
    pub fn from_public_key_pem(pem: &str) -> Result<Self, CipherError> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Cipher for the BNAC server's embedded key.
    pub fn server() -> Result<Self, CipherError> {
        Self::from_public_key_pem(SERVER_PUBLIC_KEY_PEM)
    }

    /// Modulus size in bytes (also the ciphertext size).
    pub fn key_size(&self) -> usize {
        self.key.size()
    }
}

impl PasswordCipher for RsaCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let mut rng = rand::thread_rng();
        let ciphertext = self.key.encrypt(&mut rng, Pkcs1v15Encrypt, plaintext)?;
        Ok(hex::encode(ciphertext))
    }
}
