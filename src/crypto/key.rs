//! Key material for the secrets store.
//!
//! The key is kept as hex text, either in an environment variable or in
//! a sidecar key file next to the secrets file.  Lookup order is the
//! environment variable first, then the key file.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::RngCore;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use super::cipher::Algorithm;
use crate::errors::{Result, SecretsError};

/// Raw key bytes, zeroed when dropped.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey {
    bytes: Vec<u8>,
}

impl SecretKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Decode hex key material and check it against the cipher's key length.
    ///
    /// Surrounding whitespace is ignored so a key file that an editor
    /// saved with a trailing newline still works.
    pub fn from_hex(text: &str, algorithm: Algorithm) -> Result<Self> {
        let bytes = hex::decode(text.trim()).map_err(|_| SecretsError::InvalidKeyEncoding)?;
        let key = Self { bytes };

        let expected = algorithm.key_len();
        if key.len() != expected {
            return Err(SecretsError::InvalidKeyLength {
                expected,
                actual: key.len(),
            });
        }
        Ok(key)
    }

    /// Generate a fresh random key sized for `algorithm`.
    pub fn generate(algorithm: Algorithm) -> Self {
        let mut bytes = vec![0u8; algorithm.key_len()];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex form of the key, as written to the key file.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.bytes))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    KeyFile,
}

/// Resolves the store's key from the environment or the key file.
///
/// Read-only: it never creates or modifies the key file.
#[derive(Debug, Clone)]
pub struct KeyProvider {
    env_key: String,
    key_path: PathBuf,
    algorithm: Algorithm,
}

impl KeyProvider {
    pub fn new(
        env_key: impl Into<String>,
        key_path: impl Into<PathBuf>,
        algorithm: Algorithm,
    ) -> Self {
        Self {
            env_key: env_key.into(),
            key_path: key_path.into(),
            algorithm,
        }
    }

    pub fn env_key(&self) -> &str {
        &self.env_key
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Resolve the key, failing with `MissingKey` if no source has one.
    pub fn resolve(&self) -> Result<SecretKey> {
        match self.lookup()? {
            Some((key, _)) => Ok(key),
            None => Err(SecretsError::MissingKey {
                env_key: self.env_key.clone(),
            }),
        }
    }

    /// Look the key up without treating its absence as an error.
    ///
    /// Present but malformed material is still an error.
    pub fn lookup(&self) -> Result<Option<(SecretKey, KeySource)>> {
        // 1. Environment variable, if set and non-empty.
        match std::env::var(&self.env_key) {
            Ok(value) if !value.trim().is_empty() => {
                let value = Zeroizing::new(value);
                debug!(env_key = %self.env_key, "using key from environment");
                let key = SecretKey::from_hex(&value, self.algorithm)?;
                return Ok(Some((key, KeySource::Environment)));
            }
            Ok(_) | Err(std::env::VarError::NotPresent) => {}
            Err(std::env::VarError::NotUnicode(_)) => {
                return Err(SecretsError::InvalidKeyEncoding);
            }
        }

        // 2. Key file, if it exists and is not empty.
        if !self.key_path.exists() {
            return Ok(None);
        }
        let contents = Zeroizing::new(fs::read_to_string(&self.key_path).map_err(|e| {
            SecretsError::KeyfileError(format!(
                "failed to read {}: {e}",
                self.key_path.display()
            ))
        })?);
        if contents.trim().is_empty() {
            return Ok(None);
        }

        debug!(path = %self.key_path.display(), "using key from key file");
        let key = SecretKey::from_hex(&contents, self.algorithm)?;
        Ok(Some((key, KeySource::KeyFile)))
    }
}

/// Resolve a key from `env_key` or the file at `key_path`.
pub fn resolve(env_key: &str, key_path: &Path, algorithm: Algorithm) -> Result<SecretKey> {
    KeyProvider::new(env_key, key_path, algorithm).resolve()
}

/// Write `key` as hex to a new key file at `path`.
///
/// Never overwrites: an existing file is a `KeyfileError`.  On Unix the
/// file is created owner-only (0600).
pub fn write_key_file(path: &Path, key: &SecretKey) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                SecretsError::KeyfileError(format!("cannot create key file directory: {e}"))
            })?;
        }
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            SecretsError::KeyfileError(format!("key file already exists at {}", path.display()))
        } else {
            SecretsError::KeyfileError(format!("failed to create key file: {e}"))
        }
    })?;

    file.write_all(key.to_hex().as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| SecretsError::KeyfileError(format!("failed to write key file: {e}")))?;

    debug!(path = %path.display(), "wrote key file");
    Ok(())
}
