//! High-level operations on the encrypted secrets file.
//!
//! `SecretsStore` owns the envelope and key file paths and composes the
//! key provider, the cipher codec and edit sessions into the operations
//! the CLI exposes: `initialize`, `read` and `edit_in_place`.

use std::fs;
use std::path::{Path, PathBuf};

use rand::RngCore;
use tracing::{debug, info};
use zeroize::{Zeroize, Zeroizing};

use super::editor::{Editor, ExternalEditor};
use super::ignore;
use super::session::{EditOutcome, EditSession};
use crate::config::Settings;
use crate::crypto::key::{self, KeyProvider, KeySource, SecretKey};
use crate::crypto::CipherCodec;
use crate::errors::{Result, SecretsError};

/// Where the key used by `initialize` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Passed in by the caller.
    Supplied,
    /// Found in the environment variable.
    Environment,
    /// Found in an existing key file.
    KeyFile,
    /// Freshly generated.
    Generated,
}

/// Result of `SecretsStore::initialize`.
#[derive(Debug)]
pub enum InitOutcome {
    /// The envelope already existed; nothing was touched.
    AlreadyInitialized,
    /// A new envelope was written.
    Created {
        key_hex: Zeroizing<String>,
        key_origin: KeyOrigin,
        key_file_created: bool,
        ignore_file_updated: bool,
        placeholder: Zeroizing<String>,
    },
}

/// Result of `SecretsStore::edit_in_place`.
#[derive(Debug)]
pub struct EditReport {
    /// Set when the edit had to set the store up first.
    pub setup: Option<InitOutcome>,
    pub outcome: EditOutcome,
}

/// The encrypted secrets file of one project.
pub struct SecretsStore {
    /// Path to the hex envelope, e.g. `secrets.yml.enc`.
    envelope_path: PathBuf,

    /// Path to the ignore-file patched on first setup.
    ignore_path: PathBuf,

    /// Name of the key file as written to the ignore-file.
    key_file_name: String,

    /// Envelope suffix, used to name edit temp files.
    extname: String,

    provider: KeyProvider,
    codec: CipherCodec,
}

impl SecretsStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Build a store for `project_dir` using the paths in `settings`.
    ///
    /// Nothing is read or written until an operation is called.
    pub fn new(project_dir: &Path, settings: &Settings) -> Self {
        Self {
            envelope_path: settings.envelope_path(project_dir),
            ignore_path: settings.ignore_path(project_dir),
            key_file_name: settings.key_file_name(),
            extname: settings.extname.clone(),
            provider: KeyProvider::new(
                settings.env_key.clone(),
                settings.key_path(project_dir),
                settings.algorithm,
            ),
            codec: CipherCodec::new(settings.algorithm),
        }
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    /// First-time setup: key file, ignore-file entry and initial envelope.
    ///
    /// A no-op returning `AlreadyInitialized` when the envelope exists.
    /// Otherwise the key is taken from the environment or an existing key
    /// file, or freshly generated.
    pub fn initialize(&self) -> Result<InitOutcome> {
        self.initialize_inner(None)
    }

    /// Like `initialize`, but seal the store with `key`.
    ///
    /// The key is persisted to the key file, which must not exist yet.
    pub fn initialize_with_key(&self, key: SecretKey) -> Result<InitOutcome> {
        self.initialize_inner(Some(key))
    }

    fn initialize_inner(&self, supplied: Option<SecretKey>) -> Result<InitOutcome> {
        if self.is_initialized() {
            debug!(path = %self.envelope_path.display(), "envelope exists, skipping setup");
            return Ok(InitOutcome::AlreadyInitialized);
        }

        let (key, key_origin) = match supplied {
            Some(key) => (key, KeyOrigin::Supplied),
            None => match self.provider.lookup()? {
                Some((key, KeySource::Environment)) => (key, KeyOrigin::Environment),
                Some((key, KeySource::KeyFile)) => (key, KeyOrigin::KeyFile),
                None => (
                    SecretKey::generate(self.codec.algorithm()),
                    KeyOrigin::Generated,
                ),
            },
        };
        self.codec.check_key(&key)?;

        let placeholder = Zeroizing::new(placeholder_document());
        let envelope = self.codec.encrypt(placeholder.as_bytes(), &key)?;

        // The ignore entry goes in before the key file: a retry after a
        // failed append would find the key file and skip the append.
        // The key must be on disk before an envelope that needs it.
        let key_file_created = matches!(key_origin, KeyOrigin::Supplied | KeyOrigin::Generated);
        if key_file_created {
            ignore::append_entry(&self.ignore_path, &self.key_file_name)?;
            key::write_key_file(self.provider.key_path(), &key)?;
            info!(path = %self.provider.key_path().display(), "created key file");
        }

        write_envelope(&self.envelope_path, &envelope)?;
        info!(path = %self.envelope_path.display(), "created encrypted secrets file");

        Ok(InitOutcome::Created {
            key_hex: key.to_hex(),
            key_origin,
            key_file_created,
            ignore_file_updated: key_file_created,
            placeholder,
        })
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Decrypt and return the secrets document.
    ///
    /// Returns an empty string if the store has not been set up yet.
    pub fn read(&self) -> Result<String> {
        if !self.is_initialized() {
            return Ok(String::new());
        }

        let key = self.provider.resolve()?;
        let plaintext = self.decrypt_envelope(&key)?;

        // Convert via from_utf8 which takes ownership (no clone).
        // On error, zeroize the bytes inside the error before discarding.
        String::from_utf8(plaintext).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            SecretsError::SerializationError("secrets file is not valid UTF-8".to_string())
        })
    }

    fn decrypt_envelope(&self, key: &SecretKey) -> Result<Vec<u8>> {
        let raw = fs::read(&self.envelope_path)?;
        // A valid envelope is hex text; anything else was tampered with.
        let envelope = String::from_utf8(raw).map_err(|_| SecretsError::DecryptionFailed)?;
        self.codec.decrypt(&envelope, key)
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Edit the document in `$EDITOR`.
    ///
    /// Fails with `EditorNotConfigured` before touching anything when no
    /// editor is set.
    pub fn edit_in_place(&self) -> Result<EditReport> {
        let editor = ExternalEditor::from_env()?;
        self.edit_with(&editor)
    }

    /// Run one edit session with `editor`.
    ///
    /// Sets the store up first if needed; the setup outcome is returned in
    /// the report so callers can show the new key.  The key is resolved
    /// once for the session and dropped when it ends.
    pub fn edit_with<E: Editor + ?Sized>(&self, editor: &E) -> Result<EditReport> {
        let setup = if self.is_initialized() {
            None
        } else {
            Some(self.initialize()?)
        };

        let key = self.provider.resolve()?;
        let plaintext = Zeroizing::new(self.decrypt_envelope(&key)?);

        let session = EditSession::new(&self.envelope_path, &self.extname);
        debug!(temp = %session.temp_path().display(), "starting edit session");
        let outcome = session.run(plaintext.as_slice(), editor, |edited| {
            self.codec.encrypt(edited, &key)
        })?;
        Ok(EditReport { setup, outcome })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns `true` once the envelope file exists.
    pub fn is_initialized(&self) -> bool {
        self.envelope_path.exists()
    }

    pub fn envelope_path(&self) -> &Path {
        &self.envelope_path
    }

    pub fn key_path(&self) -> &Path {
        self.provider.key_path()
    }

    pub fn ignore_path(&self) -> &Path {
        &self.ignore_path
    }

    pub fn env_key(&self) -> &str {
        self.provider.env_key()
    }
}

/// The document a fresh store starts with.
fn placeholder_document() -> String {
    let mut sample = [0u8; 20];
    rand::rng().fill_bytes(&mut sample);
    format!(
        "# You can generating keys here.\n# production:\n#   external_api_key: {}\n",
        hex::encode(sample)
    )
}

/// Replace the envelope at `path` with `envelope` atomically.
///
/// Writes a sibling temp file and renames it over the target, so readers
/// see either the old envelope or the new one, never a partial write.
pub(crate) fn write_envelope(path: &Path, envelope: &str) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    if let Err(e) = fs::write(&tmp_path, envelope).and_then(|()| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn placeholder_has_header_and_sample_key() {
        let doc = placeholder_document();
        assert!(doc.starts_with("# You can generating keys here.\n# production:\n"));
        let sample = doc.lines().nth(2).unwrap();
        let value = sample.strip_prefix("#   external_api_key: ").unwrap();
        assert_eq!(value.len(), 40);
        assert!(value.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn write_envelope_replaces_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.yml.enc");
        fs::write(&path, "old").unwrap();

        write_envelope(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let names: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn write_envelope_into_missing_directory_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("secrets.yml.enc");
        assert!(matches!(
            write_envelope(&path, "new"),
            Err(SecretsError::Io(_))
        ));
    }
}
