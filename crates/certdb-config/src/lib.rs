//! # certdb-config
//!
//! Layered configuration loading for certdb using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CERTDB_*` prefix, `__` as separator)
//! 2. Project-level `./certdb.toml`
//! 3. User-level `~/.config/certdb/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `CERTDB_RUN__CONFIDENCE_FLOOR` to `run.confidence_floor`,
//! `CERTDB_SERVER__BIND` to `server.bind`, and so on.

mod discovery;
mod error;
mod paths;
mod run;
mod server;

pub use discovery::DiscoveryConfig;
pub use error::ConfigError;
pub use paths::PathsConfig;
pub use run::{RunConfig, RunTarget, TestTemplate};
pub use server::ServerConfig;

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Project-local config file name, resolved against the working directory.
pub const PROJECT_CONFIG_FILE: &str = "certdb.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CertdbConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl CertdbConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load `dir/.env` when present, then [`Self::load_from`] the same
    /// directory. Variables already set in the process win over the file.
    pub fn load_with_dotenv(dir: &Path) -> Result<Self, ConfigError> {
        let env_path = dir.join(".env");
        if env_path.exists() {
            dotenvy::from_path(&env_path).map_err(|source| ConfigError::Dotenv {
                path: env_path.clone(),
                source,
            })?;
        }
        Self::load_from(dir)
    }

    /// Extract and validate a configuration from an arbitrary figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Self::load`], with the project file resolved against `dir`
    /// instead of the working directory.
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment_in(dir))
    }

    /// Build the figment provider chain.
    pub fn figment() -> Figment {
        Self::figment_in(Path::new("."))
    }

    /// Provider chain whose project-level file is `dir/certdb.toml`.
    pub fn figment_in(dir: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = dir.join(PROJECT_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("CERTDB_").split("__"))
    }

    /// Path to the user-global config file.
    #[must_use]
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("certdb").join("config.toml"))
    }

    /// Reject values no run can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.validate()?;
        if self.discovery.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "discovery.timeout_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.bind".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}
