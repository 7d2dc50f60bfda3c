//! Vault module — the encrypted secrets file and its edit protocol.
//!
//! This module provides:
//! - High-level `SecretsStore` for setting up, reading and editing (`store`)
//! - The temp-file based edit session (`session`)
//! - The `Editor` seam and the `$EDITOR` subprocess (`editor`)
//! - Ignore-file patching for the key file (`ignore`)

pub mod editor;
pub mod ignore;
pub mod session;
pub mod store;

// Re-export the most commonly used items.
pub use editor::{Editor, ExternalEditor};
pub use session::{EditOutcome, EditSession};
pub use store::{EditReport, InitOutcome, KeyOrigin, SecretsStore};
