use thiserror::Error;

/// All errors that can occur while managing the secrets store.
#[derive(Debug, Error)]
pub enum SecretsError {
    // --- Key errors ---
    #[error(
        "Missing encryption key to decrypt secrets with. Ask your team for your secrets key and put it in ${env_key}"
    )]
    MissingKey { env_key: String },

    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Invalid key encoding: the key must be hex encoded")]
    InvalidKeyEncoding,

    #[error("Keyfile error: {0}")]
    KeyfileError(String),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong key or corrupted secrets file")]
    DecryptionFailed,

    // --- Editor errors ---
    #[error("No $EDITOR configured to open decrypted secrets in")]
    EditorNotConfigured,

    #[error("Editor error: {0}")]
    EditorError(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, SecretsError>;
