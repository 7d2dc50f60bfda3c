//! One decrypt → edit → re-encrypt cycle over a plaintext temp file.
//!
//! The plaintext only ever exists in a temp file owned by a
//! [`TempFile`] guard; the guard wipes and removes it when dropped, so
//! every exit path (success, editor failure, encryption failure, a
//! panic unwinding through the session) leaves nothing behind.  The
//! envelope itself is only replaced after the new one has been sealed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::RngCore;
use tracing::debug;
use zeroize::Zeroizing;

use super::editor::Editor;
use super::store::write_envelope;
use crate::errors::Result;

/// Length of the random temp-file suffix in bytes (hex doubles it).
const SUFFIX_LEN: usize = 8;

/// What an edit session did to the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The document changed and was re-encrypted.
    Saved,
    /// The document came back unchanged; it was re-sealed with a fresh nonce.
    Unchanged,
}

/// A single edit of the envelope at `envelope_path`.
#[derive(Debug)]
pub struct EditSession {
    envelope_path: PathBuf,
    temp_path: PathBuf,
}

impl EditSession {
    /// Prepare a session with a fresh, unique temp path next to the envelope.
    pub fn new(envelope_path: &Path, extname: &str) -> Self {
        Self {
            envelope_path: envelope_path.to_path_buf(),
            temp_path: temp_path_for(envelope_path, extname),
        }
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Run the session.
    ///
    /// `plaintext` is the decrypted document; `seal` turns the edited
    /// bytes into a new envelope.  If the editor or `seal` fails, the
    /// envelope on disk is untouched and the error is returned after the
    /// temp file is gone.
    pub fn run<E, F>(self, plaintext: &[u8], editor: &E, seal: F) -> Result<EditOutcome>
    where
        E: Editor + ?Sized,
        F: FnOnce(&[u8]) -> Result<String>,
    {
        let temp = TempFile::create(self.temp_path, plaintext)?;
        debug!(path = %temp.path().display(), "wrote plaintext temp file");

        editor.edit(temp.path())?;

        let edited = Zeroizing::new(fs::read(temp.path())?);
        let envelope = seal(edited.as_slice())?;
        write_envelope(&self.envelope_path, &envelope)?;

        if edited.as_slice() == plaintext {
            Ok(EditOutcome::Unchanged)
        } else {
            Ok(EditOutcome::Saved)
        }
    }
}

/// Temp path for editing `envelope_path`.
///
/// `dir/secrets.yml.enc` becomes `dir/.secrets.yml.<16 hex chars>.enc`.
pub fn temp_path_for(envelope_path: &Path, extname: &str) -> PathBuf {
    let name = envelope_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, ext) = match name.strip_suffix(extname) {
        Some(stem) if !extname.is_empty() => (stem.to_string(), extname),
        _ => (name.clone(), ""),
    };

    let mut suffix = [0u8; SUFFIX_LEN];
    rand::rng().fill_bytes(&mut suffix);

    let parent = envelope_path.parent().unwrap_or(Path::new("."));
    parent.join(format!(".{stem}.{}{ext}", hex::encode(suffix)))
}

/// A plaintext temp file that is wiped and removed when dropped.
struct TempFile {
    path: PathBuf,
}

impl TempFile {
    /// Create the file exclusively (owner-only on Unix) and write `contents`.
    fn create(path: PathBuf, contents: &[u8]) -> Result<Self> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&path)?;
        // From here on the guard owns the path, even if the write fails.
        let guard = Self { path };
        file.write_all(contents)?;
        file.flush()?;
        Ok(guard)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Err(e) = self.wipe() {
            debug!(path = %self.path.display(), error = %e, "could not zero temp file");
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed plaintext temp file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug!(path = %self.path.display(), error = %e, "could not remove temp file"),
        }
    }
}

impl TempFile {
    /// Overwrite whatever the editor left in the file with zeros.
    fn wipe(&self) -> io::Result<()> {
        let mut file = match fs::OpenOptions::new().write(true).open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        let mut remaining = file.metadata()?.len();
        let zeros = [0u8; 4096];
        while remaining > 0 {
            let n = remaining.min(zeros.len() as u64) as usize;
            file.write_all(&zeros[..n])?;
            remaining -= n as u64;
        }
        file.sync_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SecretsError;
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let envelope = dir.path().join("secrets.yml.enc");
        fs::write(&envelope, "original-envelope").unwrap();
        (dir, envelope)
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn temp_path_uses_stem_and_random_suffix() {
        let path = temp_path_for(Path::new("/app/secrets.yml.enc"), ".enc");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(path.parent().unwrap(), Path::new("/app"));
        assert!(name.starts_with(".secrets.yml."));
        assert!(name.ends_with(".enc"));
        // ".secrets.yml." + 16 hex + ".enc"
        assert_eq!(name.len(), ".secrets.yml.".len() + 16 + ".enc".len());

        let other = temp_path_for(Path::new("/app/secrets.yml.enc"), ".enc");
        assert_ne!(path, other);
    }

    #[test]
    fn temp_path_without_matching_extname() {
        let path = temp_path_for(Path::new("vault.bin"), ".enc");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".vault.bin."));
        assert_eq!(name.len(), ".vault.bin.".len() + 16);
    }

    #[test]
    fn successful_edit_replaces_envelope_and_removes_temp() {
        let (dir, envelope) = setup();
        let seen = RefCell::new(None);

        let editor = |path: &Path| -> Result<()> {
            *seen.borrow_mut() = Some(fs::read_to_string(path).unwrap());
            fs::write(path, "foo: baz")?;
            Ok(())
        };
        let outcome = EditSession::new(&envelope, ".enc")
            .run(b"foo: bar", &editor, |edited| {
                Ok(format!("sealed:{}", String::from_utf8_lossy(edited)))
            })
            .unwrap();

        assert_eq!(outcome, EditOutcome::Saved);
        assert_eq!(seen.borrow().as_deref(), Some("foo: bar"));
        assert_eq!(fs::read_to_string(&envelope).unwrap(), "sealed:foo: baz");
        assert_eq!(entries(dir.path()), vec!["secrets.yml.enc".to_string()]);
    }

    #[test]
    fn untouched_document_is_reported_unchanged() {
        let (_dir, envelope) = setup();
        let editor = |_: &Path| -> Result<()> { Ok(()) };
        let outcome = EditSession::new(&envelope, ".enc")
            .run(b"foo: bar", &editor, |_| Ok("resealed".into()))
            .unwrap();
        assert_eq!(outcome, EditOutcome::Unchanged);
        assert_eq!(fs::read_to_string(&envelope).unwrap(), "resealed");
    }

    #[test]
    fn seal_failure_leaves_envelope_and_removes_temp() {
        let (dir, envelope) = setup();
        let editor = |path: &Path| -> Result<()> {
            fs::write(path, "changed")?;
            Ok(())
        };

        let err = EditSession::new(&envelope, ".enc")
            .run(b"foo: bar", &editor, |_| {
                Err(SecretsError::EncryptionFailed("simulated".into()))
            })
            .unwrap_err();

        assert!(matches!(err, SecretsError::EncryptionFailed(_)));
        assert_eq!(fs::read(&envelope).unwrap(), b"original-envelope");
        assert_eq!(entries(dir.path()), vec!["secrets.yml.enc".to_string()]);
    }

    #[test]
    fn editor_failure_leaves_envelope_and_removes_temp() {
        let (dir, envelope) = setup();
        let editor =
            |_: &Path| -> Result<()> { Err(SecretsError::EditorError("exit code 1".into())) };

        let sealed = RefCell::new(false);
        let err = EditSession::new(&envelope, ".enc")
            .run(b"foo: bar", &editor, |_| {
                *sealed.borrow_mut() = true;
                Ok("never".into())
            })
            .unwrap_err();

        assert!(matches!(err, SecretsError::EditorError(_)));
        assert!(!*sealed.borrow());
        assert_eq!(fs::read(&envelope).unwrap(), b"original-envelope");
        assert_eq!(entries(dir.path()), vec!["secrets.yml.enc".to_string()]);
    }

    #[test]
    fn editor_removing_temp_fails_without_touching_envelope() {
        let (dir, envelope) = setup();
        let editor = |path: &Path| -> Result<()> {
            fs::remove_file(path)?;
            Ok(())
        };

        let err = EditSession::new(&envelope, ".enc")
            .run(b"foo: bar", &editor, |_| Ok("never".into()))
            .unwrap_err();

        assert!(matches!(err, SecretsError::Io(_)));
        assert_eq!(fs::read(&envelope).unwrap(), b"original-envelope");
        assert_eq!(entries(dir.path()), vec!["secrets.yml.enc".to_string()]);
    }

    #[test]
    fn panicking_editor_still_removes_temp() {
        let (dir, envelope) = setup();
        let result = std::panic::catch_unwind(|| {
            let editor = |_: &Path| -> Result<()> { panic!("editor blew up") };
            let _ = EditSession::new(&envelope, ".enc").run(b"foo: bar", &editor, |_| {
                Ok("never".into())
            });
        });

        assert!(result.is_err());
        assert_eq!(entries(dir.path()), vec!["secrets.yml.enc".to_string()]);
    }

    #[test]
    fn dropped_temp_file_is_zeroed_before_removal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".secrets.yml.0011223344556677.enc");
        let temp = TempFile::create(path.clone(), b"api_key: 42").unwrap();

        // A second link keeps the inode readable after the guard unlinks it.
        let link = dir.path().join("link");
        fs::hard_link(&path, &link).unwrap();
        drop(temp);

        assert!(!path.exists());
        assert_eq!(fs::read(&link).unwrap(), vec![0u8; 11]);
    }

    #[test]
    fn dropping_an_already_deleted_temp_file_is_quiet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".gone.tmp");
        let temp = TempFile::create(path.clone(), b"x").unwrap();
        fs::remove_file(&path).unwrap();
        drop(temp);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn temp_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, envelope) = setup();
        let mode = RefCell::new(0);
        let editor = |path: &Path| -> Result<()> {
            *mode.borrow_mut() = fs::metadata(path)?.permissions().mode() & 0o777;
            Ok(())
        };
        EditSession::new(&envelope, ".enc")
            .run(b"x", &editor, |_| Ok("y".into()))
            .unwrap();
        assert_eq!(*mode.borrow(), 0o600);
    }
}
