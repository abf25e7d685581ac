//! Run configuration loading and validation.
//!
//! A configuration names the directory to organize and the ordered folder
//! rules to organize it with. JSON is the default format; files ending in
//! `.toml` are read as TOML instead.
//!
//! # Configuration File Format
//!
//! ```json
//! {
//!     "download_dir": "/home/me/Downloads",
//!     "folders": {
//!         "images": [".jpg", ".png"],
//!         "docs": [".pdf"]
//!     }
//! }
//! ```
//!
//! The same settings in TOML:
//!
//! ```toml
//! download_dir = "/home/me/Downloads"
//!
//! [folders]
//! images = [".jpg", ".png"]
//! docs = [".pdf"]
//! ```
//!
//! Every check happens here, before the pipeline touches the filesystem.

use crate::classifier::FolderRules;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading or validating a configuration.
///
/// All of them are fatal: a run never starts with a configuration that
/// produced one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// IO error while reading the configuration file.
    IoError(String),
    /// The file is not valid JSON/TOML or has the wrong shape.
    ConfigInvalid(String),
    /// A required top-level field is absent.
    MissingField(&'static str),
    /// `download_dir` does not exist.
    DownloadDirNotFound(PathBuf),
    /// `download_dir` exists but is not a directory.
    DownloadDirNotADirectory(PathBuf),
    /// `folders` is present but has no entries.
    NoFolders,
    /// A folder name is empty, a path, or a special component like `..`.
    InvalidFolderName(String),
    /// A folder lists an empty suffix, which would match every file.
    InvalidSuffix {
        /// The folder declaring the empty suffix.
        folder: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::MissingField(field) => {
                write!(f, "Invalid configuration: missing required field '{}'", field)
            }
            ConfigError::DownloadDirNotFound(path) => {
                write!(f, "Download directory does not exist: {}", path.display())
            }
            ConfigError::DownloadDirNotADirectory(path) => {
                write!(f, "Download directory is not a directory: {}", path.display())
            }
            ConfigError::NoFolders => {
                write!(f, "Invalid configuration: 'folders' must name at least one folder")
            }
            ConfigError::InvalidFolderName(name) => write!(
                f,
                "Invalid folder name '{}': expected a single plain directory name",
                name
            ),
            ConfigError::InvalidSuffix { folder } => {
                write!(f, "Folder '{}' lists an empty extension suffix", folder)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from a file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// On-disk shape before validation. Both fields are optional here so that a
/// missing one is reported as [`ConfigError::MissingField`].
#[derive(Debug, Deserialize)]
struct RawConfig {
    download_dir: Option<PathBuf>,
    folders: Option<FolderRules>,
}

/// A validated run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory whose top level is organized. Destination folders live inside it.
    pub download_dir: PathBuf,
    /// Ordered folder rules.
    pub folders: FolderRules,
}

impl Config {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist,
    /// `ConfigError::IoError` if it cannot be read, `ConfigError::ConfigInvalid`
    /// if parsing fails, and any validation error from [`Config::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_str_with_format(&content, ConfigFormat::from_path(path))
    }

    /// Parses and validates configuration text in the given format.
    pub fn from_str_with_format(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let raw: RawConfig = match format {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?,
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?
            }
        };

        Self::validate(raw)
    }

    /// Checks every rule that must hold before the pipeline may run.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. `download_dir` and `folders` are both present
    /// 2. `folders` is not empty
    /// 3. Each folder name is a single plain directory name
    /// 4. No folder lists an empty suffix
    /// 5. `download_dir` exists and is a directory
    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let download_dir = raw
            .download_dir
            .ok_or(ConfigError::MissingField("download_dir"))?;
        let folders = raw.folders.ok_or(ConfigError::MissingField("folders"))?;

        if folders.is_empty() {
            return Err(ConfigError::NoFolders);
        }

        for rule in folders.iter() {
            if !is_plain_folder_name(&rule.folder) {
                return Err(ConfigError::InvalidFolderName(rule.folder.clone()));
            }
            if rule.suffixes.iter().any(|suffix| suffix.is_empty()) {
                return Err(ConfigError::InvalidSuffix {
                    folder: rule.folder.clone(),
                });
            }
        }

        if !download_dir.exists() {
            return Err(ConfigError::DownloadDirNotFound(download_dir));
        }
        if !download_dir.is_dir() {
            return Err(ConfigError::DownloadDirNotADirectory(download_dir));
        }

        Ok(Self {
            download_dir,
            folders,
        })
    }

    /// Path of a configured folder inside the download directory.
    pub fn folder_path(&self, folder: &str) -> PathBuf {
        self.download_dir.join(folder)
    }
}

/// A folder name must stay directly inside the download directory.
fn is_plain_folder_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}
