//! Settings loading.
//!
//! Layers, lowest first: built-in defaults, an optional config file (TOML,
//! YAML or JSON by extension), then `SHARDWATCH_*` environment variables.
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Environment variable prefix, e.g. `SHARDWATCH_COORDINATOR`.
pub const ENV_PREFIX: &str = "SHARDWATCH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Dashboard address of the coordinator (`host:port` or URL).
    pub coordinator: String,
    /// Seconds between stats polls.
    pub refresh_interval: u64,
    pub request_timeout_ms: u64,
    /// Cluster to select at startup.
    pub cluster: Option<String>,
    /// Where tracing output goes. Nothing is logged when unset.
    pub log_file: Option<PathBuf>,
    /// Default filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            coordinator: "127.0.0.1:8080".to_string(),
            refresh_interval: 3,
            request_timeout_ms: 10_000,
            cluster: None,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, `path` (if any), and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("coordinator", defaults.coordinator)?
            .set_default("refresh_interval", defaults.refresh_interval as i64)?
            .set_default("request_timeout_ms", defaults.request_timeout_ms as i64)?
            .set_default("log_level", defaults.log_level)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(env)
            .build()
            .and_then(Config::try_deserialize)
            .with_context(|| match path {
                Some(path) => format!("invalid configuration in {}", path.display()),
                None => "invalid configuration".to_string(),
            })?;

        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }

    /// Poll interval, never shorter than one second.
    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
