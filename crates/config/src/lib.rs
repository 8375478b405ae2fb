//! Configuration for the `shelf` command-line tool.
//!
//! Values are layered with [`figment`], later sources overriding earlier ones:
//!
//! 1. built-in defaults,
//! 2. `config.toml` in the platform configuration directory,
//! 3. an explicitly given file (`--config`),
//! 4. `SHELF_`-prefixed environment variables, with `__` separating
//!    sections from keys (`SHELF_BACKUP__COMPRESSION=bzip2`).
//!
//! ```toml
//! [database]
//! path = "/home/me/.local/share/shelf/library.db"
//!
//! [backup]
//! include_chapters = true
//! include_settings = true
//! compression = "gzip"
//! envelope = "raw"
//!
//! [restore]
//! envelope = "auto"
//! pacing_ms = 0
//! poll_interval_ms = 250
//! refresh_timeout_secs = 60
//! ```
//!
//! Enumerated values are kept as strings and only checked by
//! [`Config::validate`] and the typed accessors, so that a typo is reported
//! with the key it was found under.

pub mod error;
mod load;

pub use crate::load::{Loader, load, project_dirs};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use shelf_archive::{Compression, Envelope};
use std::path::PathBuf;
use std::time::Duration;

pub const APPLICATION: &str = "shelf";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub restore: RestoreConfig,
}

impl Config {
    /// Check every value that the typed accessors would otherwise only
    /// check on use.
    pub fn validate(&self) -> Result<()> {
        self.backup.compression()?;
        self.backup.envelope()?;
        self.restore.envelope()?;
        if self.restore.poll_interval_ms == 0 {
            exn::bail!(ErrorKind::Invalid("restore.poll_interval_ms"));
        }
        if self.database.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("database.path"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// The SQLite library database.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: load::data_dir().join("library.db") }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub include_chapters: bool,
    pub include_settings: bool,
    pub compression: String,
    pub envelope: String,
    /// Where exported archives go when no output file is given.
    pub directory: PathBuf,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            include_chapters: true,
            include_settings: true,
            compression: Compression::default().as_str().to_string(),
            envelope: Envelope::default().as_str().to_string(),
            directory: load::data_dir().join("backups"),
        }
    }
}

impl BackupConfig {
    pub fn compression(&self) -> Result<Compression> {
        self.compression.parse::<Compression>().or_raise(|| ErrorKind::Invalid("backup.compression"))
    }

    pub fn envelope(&self) -> Result<Envelope> {
        self.envelope.parse::<Envelope>().or_raise(|| ErrorKind::Invalid("backup.envelope"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestoreConfig {
    /// `auto` to detect the envelope from the archive bytes.
    pub envelope: String,
    pub pacing_ms: u64,
    pub poll_interval_ms: u64,
    pub refresh_timeout_secs: u64,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self { envelope: "auto".to_string(), pacing_ms: 0, poll_interval_ms: 250, refresh_timeout_secs: 60 }
    }
}

impl RestoreConfig {
    /// `None` when the envelope should be detected.
    pub fn envelope(&self) -> Result<Option<Envelope>> {
        if self.envelope.eq_ignore_ascii_case("auto") {
            return Ok(None);
        }
        self.envelope.parse::<Envelope>().map(Some).or_raise(|| ErrorKind::Invalid("restore.envelope"))
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.backup.compression().unwrap(), Compression::Gzip);
        assert_eq!(config.backup.envelope().unwrap(), Envelope::Raw);
        assert_eq!(config.restore.envelope().unwrap(), None);
        assert_eq!(config.restore.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.restore.refresh_timeout(), Duration::from_secs(60));
        assert!(config.database.path.ends_with("library.db"));
    }

    #[rstest]
    #[case("AUTO", None)]
    #[case("raw", Some(Envelope::Raw))]
    #[case("base64", Some(Envelope::Base64))]
    fn test_restore_envelope(#[case] value: &str, #[case] expected: Option<Envelope>) {
        let config = RestoreConfig { envelope: value.to_string(), ..Default::default() };
        assert_eq!(config.envelope().unwrap(), expected);
    }

    #[rstest]
    #[case::compression(Config { backup: BackupConfig { compression: "rar".to_string(), ..Default::default() }, ..Default::default() }, "backup.compression")]
    #[case::backup_envelope(Config { backup: BackupConfig { envelope: "hex".to_string(), ..Default::default() }, ..Default::default() }, "backup.envelope")]
    #[case::restore_envelope(Config { restore: RestoreConfig { envelope: "hex".to_string(), ..Default::default() }, ..Default::default() }, "restore.envelope")]
    #[case::poll_interval(Config { restore: RestoreConfig { poll_interval_ms: 0, ..Default::default() }, ..Default::default() }, "restore.poll_interval_ms")]
    fn test_invalid_values(#[case] config: Config, #[case] key: &'static str) {
        let err = config.validate().unwrap_err();
        assert_eq!(*err, ErrorKind::Invalid(key));
    }
}
