use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::Algorithm;
use crate::errors::{Result, SecretsError};

/// Project-level configuration, loaded from `.secrets.toml`.
///
/// Every field has a default so the tool works without any config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Cipher used for the envelope (default: aes-128-gcm).
    #[serde(default)]
    pub algorithm: Algorithm,

    /// Environment variable that may hold the hex key.
    #[serde(default = "default_env_key")]
    pub env_key: String,

    /// Suffix of the encrypted envelope file.
    #[serde(default = "default_extname")]
    pub extname: String,

    /// Base name of the secrets file (relative to the project root).
    #[serde(default = "default_file")]
    pub file: String,

    /// Ignore-file the key file name is appended to on setup.
    #[serde(default = "default_git_ignore_file")]
    pub git_ignore_file: String,

    /// Suffix of the key file.
    #[serde(default = "default_key_extname")]
    pub key_extname: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_env_key() -> String {
    "SECRETS_KEY".to_string()
}

fn default_extname() -> String {
    ".enc".to_string()
}

fn default_file() -> String {
    "secrets.yml".to_string()
}

fn default_git_ignore_file() -> String {
    ".gitignore".to_string()
}

fn default_key_extname() -> String {
    ".key".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            env_key: default_env_key(),
            extname: default_extname(),
            file: default_file(),
            git_ignore_file: default_git_ignore_file(),
            key_extname: default_key_extname(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".secrets.toml";

    /// Load settings from `<project_dir>/.secrets.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            SecretsError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.file.trim().is_empty() {
            return Err(SecretsError::ConfigError("`file` cannot be empty".into()));
        }
        if self.env_key.trim().is_empty() {
            return Err(SecretsError::ConfigError("`env_key` cannot be empty".into()));
        }
        if self.extname == self.key_extname {
            return Err(SecretsError::ConfigError(
                "`extname` and `key_extname` must differ".into(),
            ));
        }
        Ok(())
    }

    /// Key file name as written to the ignore-file, e.g. `secrets.yml.key`.
    pub fn key_file_name(&self) -> String {
        format!("{}{}", self.file, self.key_extname)
    }

    /// Full path to the encrypted envelope, e.g. `project/secrets.yml.enc`.
    pub fn envelope_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(format!("{}{}", self.file, self.extname))
    }

    /// Full path to the key file, e.g. `project/secrets.yml.key`.
    pub fn key_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(self.key_file_name())
    }

    /// Full path to the ignore-file, e.g. `project/.gitignore`.
    pub fn ignore_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.git_ignore_file)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_match_documented_defaults() {
        let s = Settings::default();
        assert_eq!(s.algorithm, Algorithm::Aes128Gcm);
        assert_eq!(s.env_key, "SECRETS_KEY");
        assert_eq!(s.extname, ".enc");
        assert_eq!(s.file, "secrets.yml");
        assert_eq!(s.git_ignore_file, ".gitignore");
        assert_eq!(s.key_extname, ".key");
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
algorithm = "aes-256-gcm"
env_key = "APP_SECRETS_KEY"
extname = ".sealed"
file = "config/credentials.yml"
git_ignore_file = ".hgignore"
key_extname = ".master"
"#;
        fs::write(tmp.path().join(".secrets.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.algorithm, Algorithm::Aes256Gcm);
        assert_eq!(settings.env_key, "APP_SECRETS_KEY");
        assert_eq!(settings.extname, ".sealed");
        assert_eq!(settings.file, "config/credentials.yml");
        assert_eq!(settings.git_ignore_file, ".hgignore");
        assert_eq!(settings.key_extname, ".master");
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".secrets.toml"), "file = \"app.yml\"\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.file, "app.yml");
        assert_eq!(settings.env_key, "SECRETS_KEY");
        assert_eq!(settings.extname, ".enc");
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".secrets.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_errors_on_unknown_algorithm() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".secrets.toml"), "algorithm = \"des\"\n").unwrap();
        assert!(matches!(
            Settings::load(tmp.path()),
            Err(SecretsError::ConfigError(_))
        ));
    }

    #[test]
    fn load_errors_when_suffixes_collide() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".secrets.toml"), "key_extname = \".enc\"\n").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn derived_paths() {
        let s = Settings::default();
        let project = Path::new("/home/user/app");
        assert_eq!(
            s.envelope_path(project),
            PathBuf::from("/home/user/app/secrets.yml.enc")
        );
        assert_eq!(
            s.key_path(project),
            PathBuf::from("/home/user/app/secrets.yml.key")
        );
        assert_eq!(
            s.ignore_path(project),
            PathBuf::from("/home/user/app/.gitignore")
        );
        assert_eq!(s.key_file_name(), "secrets.yml.key");
    }
}
