//! Cryptographic primitives for the secrets store.
//!
//! This module provides:
//! - AES-GCM envelope encryption and decryption (`cipher`)
//! - Key material, key lookup and key file creation (`key`)

pub mod cipher;
pub mod key;

pub use cipher::{Algorithm, CipherCodec};
pub use key::{KeyProvider, KeySource, SecretKey};
