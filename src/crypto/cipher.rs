//! AES-GCM authenticated encryption of the secrets document.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  The whole blob is hex encoded so the
//! envelope on disk is plain text that editors and VCS treat as opaque.
//!
//! Layout of the envelope before hex encoding:
//!   [ 12-byte nonce | ciphertext | 16-byte auth tag ]

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, Nonce, OsRng};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use serde::{Deserialize, Serialize};

use super::key::SecretKey;
use crate::errors::{Result, SecretsError};

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// The AEAD cipher used to seal the envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "aes-128-gcm")]
    Aes128Gcm,
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
}

impl Algorithm {
    /// Raw key length in bytes required by this cipher.
    pub fn key_len(self) -> usize {
        match self {
            Self::Aes128Gcm => 16,
            Self::Aes256Gcm => 32,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aes128Gcm => "aes-128-gcm",
            Self::Aes256Gcm => "aes-256-gcm",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encrypts plaintext into hex envelopes and back for one algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct CipherCodec {
    algorithm: Algorithm,
}

impl CipherCodec {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Encrypt `plaintext` and return the hex-encoded envelope.
    pub fn encrypt(&self, plaintext: &[u8], key: &SecretKey) -> Result<String> {
        self.check_key(key)?;
        let sealed = match self.algorithm {
            Algorithm::Aes128Gcm => seal::<Aes128Gcm>(key.as_bytes(), plaintext)?,
            Algorithm::Aes256Gcm => seal::<Aes256Gcm>(key.as_bytes(), plaintext)?,
        };
        Ok(hex::encode(sealed))
    }

    /// Decrypt an envelope produced by `encrypt`.
    ///
    /// Malformed hex, truncated input and tag mismatches all fail with
    /// `DecryptionFailed`; no partial plaintext is ever returned.
    pub fn decrypt(&self, envelope: &str, key: &SecretKey) -> Result<Vec<u8>> {
        self.check_key(key)?;
        let raw = hex::decode(envelope.trim()).map_err(|_| SecretsError::DecryptionFailed)?;

        // Anything shorter than nonce + tag cannot be a valid envelope.
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(SecretsError::DecryptionFailed);
        }

        match self.algorithm {
            Algorithm::Aes128Gcm => open::<Aes128Gcm>(key.as_bytes(), &raw),
            Algorithm::Aes256Gcm => open::<Aes256Gcm>(key.as_bytes(), &raw),
        }
    }

    /// Fail with `InvalidKeyLength` unless `key` fits this cipher.
    pub fn check_key(&self, key: &SecretKey) -> Result<()> {
        let expected = self.algorithm.key_len();
        if key.len() != expected {
            return Err(SecretsError::InvalidKeyLength {
                expected,
                actual: key.len(),
            });
        }
        Ok(())
    }
}

fn seal<C>(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: Aead + AeadCore + KeyInit,
{
    let cipher = C::new_from_slice(key)
        .map_err(|e| SecretsError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = C::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| SecretsError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

fn open<C>(key: &[u8], sealed: &[u8]) -> Result<Vec<u8>>
where
    C: Aead + AeadCore + KeyInit,
{
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::<C>::from_slice(nonce_bytes);

    let cipher = C::new_from_slice(key).map_err(|_| SecretsError::DecryptionFailed)?;

    // Verifies the auth tag before any plaintext is released.
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| SecretsError::DecryptionFailed)
}
