//! Configuration file handling.
//!
//! The configuration file is stored at `$FUEL_HOME/config.json`. It holds the user mode, the
//! location of the remote metadata API, backup settings and, optionally, a custom location for
//! the key-value storage file.

use crate::backup::Backup;
use crate::error::{ErrorType, IntoResult, Res};
use crate::store::FileStore;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "fuel";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const PAGE_LIMIT: u32 = 100;
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
const STORAGE_JSON: &str = "storage.json";

pub(crate) const DEFAULT_API_URL: &str = "https://seventoursvietnam.com/rest-api/api/";
pub(crate) const DEFAULT_API_TOKEN: &str = "1234567890";
pub(crate) const DEFAULT_META_KEY: &str = "fuel";

/// Whether transactions live only on this machine or are also kept in the remote API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum UserMode {
    /// Local storage only.
    #[default]
    Guest,
    /// Local storage plus the remote metadata API.
    Registered,
}

serde_plain::derive_display_from_serialize!(UserMode);
serde_plain::derive_fromstr_from_deserialize!(UserMode);

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FUEL_HOME` and from there it loads `$FUEL_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory, its backups directory, an initial `config.json` with default
    /// settings and an empty storage file.
    ///
    /// # Errors
    /// - Returns an error if `dir` already holds a `config.json` or if any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::create_inner(dir.into())
            .await
            .pub_result(ErrorType::Config)
    }

    /// Validates that `fuel_home` and its config file exist, loads the config file and checks
    /// that the backups directory is present.
    pub async fn load(fuel_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(fuel_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(maybe_relative: PathBuf) -> Res<Self> {
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the fuel home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            );
        }

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let config = Self {
            root,
            backups,
            config_path,
            config_file,
        };
        FileStore::create(config.storage_path())?;
        Ok(config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The fuel home directory is missing, run 'fuel init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            backups: root.join(BACKUPS),
            root,
            config_path,
            config_file,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn user_mode(&self) -> UserMode {
        self.config_file.user_mode
    }

    pub fn api_url(&self) -> &str {
        &self.config_file.api_url
    }

    pub fn api_token(&self) -> &str {
        &self.config_file.api_token
    }

    pub fn meta_key(&self) -> &str {
        &self.config_file.meta_key
    }

    pub fn page_limit(&self) -> u32 {
        self.config_file.page_limit
    }

    /// The key-value storage file. A relative `storage_path` is resolved against the home
    /// directory.
    pub fn storage_path(&self) -> PathBuf {
        match &self.config_file.storage_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.root.join(p),
            None => self.root.join(STORAGE_JSON),
        }
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Changes the user mode and writes `config.json`.
    pub async fn set_user_mode(&mut self, user_mode: UserMode) -> Res<()> {
        if self.config_file.user_mode == user_mode {
            return Ok(());
        }
        let mut updated = self.config_file.clone();
        updated.user_mode = user_mode;
        updated.save(&self.config_path).await?;
        self.config_file = updated;
        Ok(())
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "fuel",
///   "config_version": 1,
///   "user_mode": "guest",
///   "api_url": "https://seventoursvietnam.com/rest-api/api/",
///   "api_token": "1234567890",
///   "meta_key": "fuel",
///   "page_limit": 100,
///   "backup_copies": 5
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct ConfigFile {
    /// Application name, should always be "fuel"
    app_name: String,

    config_version: u8,

    #[serde(default)]
    user_mode: UserMode,

    /// Base URL of the remote metadata API
    #[serde(default = "default_api_url")]
    api_url: String,

    /// Token sent as `tokenkey` with every write
    #[serde(default = "default_api_token")]
    api_token: String,

    /// The `meta_key` that marks fuel records
    #[serde(default = "default_meta_key")]
    meta_key: String,

    #[serde(default = "default_page_limit")]
    page_limit: u32,

    /// Number of backup copies to keep per prefix
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// Location of the key-value storage file (optional, relative to config.json or absolute).
    /// Defaults to $FUEL_HOME/storage.json
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage_path: Option<PathBuf>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_api_token() -> String {
    DEFAULT_API_TOKEN.to_string()
}

fn default_meta_key() -> String {
    DEFAULT_META_KEY.to_string()
}

fn default_page_limit() -> u32 {
    PAGE_LIMIT
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            user_mode: UserMode::Guest,
            api_url: default_api_url(),
            api_token: default_api_token(),
            meta_key: default_meta_key(),
            page_limit: PAGE_LIMIT,
            backup_copies: BACKUP_COPIES,
            storage_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path` and checks `app_name`.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(config.page_limit > 0, "page_limit must be greater than zero");
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}
