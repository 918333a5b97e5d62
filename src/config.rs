//! Configuration for the bridge binary
//!
//! Loaded from YAML. A missing file means defaults: no host, preview bridge.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::bridge::{DirectOptions, NativeCallMode};
use crate::choices::ChoiceDefaults;
use crate::sync::DEFAULT_HEARTBEAT_MS;
use crate::transport::native::DEFAULT_NATIVE_TIMEOUT_MS;

/// Shortest heartbeat interval accepted
pub const MIN_HEARTBEAT_MS: u64 = 10;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<HostConfig>,
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,
    /// Replaces or adds default choice lists by parameter name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub choices: BTreeMap<String, Vec<String>>,
}

/// Host connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    pub url: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default)]
    pub native_calls: NativeCallMode,
    #[serde(default = "default_native_timeout_ms")]
    pub native_timeout_ms: u64,
}

impl HostConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn direct_options(&self) -> DirectOptions {
        DirectOptions {
            native_calls: self.native_calls,
            native_timeout: Duration::from_millis(self.native_timeout_ms),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: None,
            heartbeat_ms: default_heartbeat_ms(),
            choices: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        config.validate()?;

        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if fs::try_exists(Path::new(path)).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_ms < MIN_HEARTBEAT_MS {
            anyhow::bail!(
                "heartbeat_ms must be at least {} (got {})",
                MIN_HEARTBEAT_MS,
                self.heartbeat_ms
            );
        }

        if let Some(host) = &self.host {
            if host.url.is_empty() {
                anyhow::bail!("host url cannot be empty");
            }
            if host.connect_timeout_ms == 0 {
                anyhow::bail!("host connect_timeout_ms must be greater than 0");
            }
            if host.native_timeout_ms == 0 {
                anyhow::bail!("host native_timeout_ms must be greater than 0");
            }
        }

        for (name, items) in &self.choices {
            if items.is_empty() {
                anyhow::bail!("Choice list '{}' cannot be empty", name);
            }
        }

        Ok(())
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    pub fn choice_defaults(&self) -> ChoiceDefaults {
        ChoiceDefaults::with_overrides(&self.choices)
    }
}

fn default_heartbeat_ms() -> u64 {
    DEFAULT_HEARTBEAT_MS
}
fn default_connect_timeout_ms() -> u64 {
    1500
}
fn default_native_timeout_ms() -> u64 {
    DEFAULT_NATIVE_TIMEOUT_MS
}
