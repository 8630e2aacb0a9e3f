//! Configuration file support for omg.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. `OMG_DATABASE_URL`, `OMG_GITHUB_TOKEN`, `OMG_GITHUB_API_ROOT`,
//!    `OMG_SYNC_PAGE_SIZE` and `OMG_SYNC_MAX_PAGES`
//! 2. `GITHUB_TOKEN`, only when no token was configured elsewhere
//! 3. Local config file (`./omg.toml`)
//! 4. User config file (`~/.config/omg/config.toml` on Linux)
//! 5. Built-in defaults
//!
//! The database defaults to `omg.db` in the platform state directory
//! (`~/.local/state/omg/omg.db` on Linux).
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite:///home/me/.local/state/omg/omg.db?mode=rwc"
//!
//! [github]
//! token = "ghp_..."  # or OMG_GITHUB_TOKEN / GITHUB_TOKEN
//! api_root = "https://api.github.com"
//!
//! [sync]
//! page_size = 100
//! max_pages = 50
//! ```

use std::path::{Path, PathBuf};

use config::{Config as ConfigBuilder, ConfigError, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::OmgError;
use crate::github::{GitHubClient, PER_PAGE};
use crate::sync::SyncOptions;

const APP_NAME: &str = "omg";
const LOCAL_CONFIG: &str = "omg.toml";
const TOKEN_FALLBACK_ENV: &str = "GITHUB_TOKEN";

/// Environment overrides and the keys they set. Key segments themselves
/// contain underscores, so the names cannot be split generically.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("OMG_DATABASE_URL", "database.url"),
    ("OMG_GITHUB_TOKEN", "github.token"),
    ("OMG_GITHUB_API_ROOT", "github.api_root"),
    ("OMG_SYNC_PAGE_SIZE", "sync.page_size"),
    ("OMG_SYNC_MAX_PAGES", "sync.max_pages"),
];

type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection URL. Unset means the default state-directory file.
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Personal access token.
    pub token: Option<String>,
    /// API root override, for GitHub Enterprise or a test server.
    pub api_root: Option<String>,
}

/// Defaults for `omg sync`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub page_size: usize,
    pub max_pages: Option<usize>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: PER_PAGE,
            max_pages: None,
        }
    }
}

impl Config {
    /// Load configuration from every layer.
    ///
    /// A config that fails to parse is logged and replaced by the defaults.
    pub fn load() -> Self {
        let mut files = Vec::new();
        if let Some(path) = Self::default_config_path()
            && path.exists()
        {
            files.push(path);
        }
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            files.push(local);
        }

        let env = |name: &str| std::env::var(name).ok();
        let mut config = match Self::from_sources(&files, &env) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}", e);
                Config::default()
            }
        };

        if config.github.token.is_none() {
            config.github.token = std::env::var(TOKEN_FALLBACK_ENV)
                .ok()
                .filter(|t| !t.is_empty());
        }
        config
    }

    /// Build from the given files (later ones win), overlaid with whatever
    /// `env` returns for the `OMG_` variables.
    fn from_sources(files: &[PathBuf], env: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();
        for path in files {
            tracing::debug!("Loading config from {:?}", path);
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }
        for (name, key) in ENV_OVERRIDES {
            let value = env(name).filter(|v| !v.is_empty());
            if value.is_some() {
                tracing::debug!("Config key {} overridden by {}", key, name);
            }
            builder = builder.set_override_option(*key, value)?;
        }
        builder.build()?.try_deserialize()
    }

    /// Load a single file, ignoring the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::from_sources(&[path.to_path_buf()], &|_: &str| None)
    }

    /// The database URL, falling back to `omg.db` in the state directory.
    ///
    /// `mode=rwc` creates the file on first use.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("omg.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    pub fn github_token(&self) -> Option<String> {
        self.github.token.clone()
    }

    /// A client authenticated with the configured token, pointed at
    /// `api_root` when one is set.
    pub fn github_client(&self) -> crate::Result<GitHubClient> {
        let token = self
            .github
            .token
            .as_deref()
            .ok_or_else(|| OmgError::Auth("no GitHub token configured".to_string()))?;
        let client = GitHubClient::new(token)?;
        Ok(match self.github.api_root.as_deref() {
            Some(root) => client.with_api_root(root),
            None => client,
        })
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            page_size: self.sync.page_size.clamp(1, PER_PAGE),
            max_pages: self.sync.max_pages,
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// On Linux, `$XDG_STATE_HOME/omg`. Elsewhere the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}
