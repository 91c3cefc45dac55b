//! Repository configuration
//!
//! Reads optional settings from `pkgplan.toml` at the repository root.
//! Every setting has a default, so a repository without the file works
//! out of the box; command-line flags override the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::defaults;
use crate::error::ConfigError;

/// Settings for one repository
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Published repository settings
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Local archive pool settings
    #[serde(default)]
    pub archives: ArchivesConfig,

    /// Remote database download settings
    #[serde(default)]
    pub download: DownloadConfig,
}

/// Published repository settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Repository (database) name
    pub name: Option<String>,

    /// Database URL template; `{slug}` and `{name}` are substituted
    pub db_url: Option<String>,
}

/// Local archive pool settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchivesConfig {
    /// Directory holding built `*.pkg.tar.zst` files
    pub dir: Option<PathBuf>,
}

/// Remote database download settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Attempts before giving up
    pub retries: Option<u32>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl PlanConfig {
    /// Load `pkgplan.toml` from a repository root
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        Self::load_from_path(&root.join(defaults::CONFIG_FILE))
    }

    /// Load configuration from a specific path
    ///
    /// A missing file yields the default configuration; a file that exists
    /// but is not valid TOML is an error.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Database URL for a repository slug (`owner/repo`) and database name
    #[must_use]
    pub fn db_url(&self, slug: &str, name: &str) -> String {
        self.repository
            .db_url
            .as_deref()
            .unwrap_or(defaults::DB_URL_TEMPLATE)
            .replace("{slug}", slug)
            .replace("{name}", name)
    }

    /// Directory of the local archive pool, relative paths taken from `root`
    #[must_use]
    pub fn archives_dir(&self, root: &Path) -> PathBuf {
        match &self.archives.dir {
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        }
    }

    /// Download attempts
    #[must_use]
    pub fn download_retries(&self) -> u32 {
        self.download
            .retries
            .unwrap_or(defaults::MAX_DOWNLOAD_RETRIES)
    }

    /// Download timeout
    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(
            self.download
                .timeout_secs
                .unwrap_or(defaults::DOWNLOAD_TIMEOUT_SECS),
        )
    }
}
