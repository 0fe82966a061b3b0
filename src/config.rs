//! Runtime configuration, read from YAML.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use command_channel::ChannelPolicy;
use form_engine::PacingPolicy;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

const APP_DIR: &str = "autofill";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutofillConfig {
    /// Delays around each field write.
    pub pacing: PacingPolicy,
    /// Attach-and-retry behavior of the command channel.
    pub channel: ChannelPolicy,
    /// JSON store file; defaults to the platform data directory.
    pub store_path: Option<PathBuf>,
    /// Used when neither `RUST_LOG` nor `--log-level` is given.
    pub log_level: Option<String>,
}

impl AutofillConfig {
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.store_path {
            return Ok(path.clone());
        }
        let mut path = dirs::data_dir().context("Failed to get data directory")?;
        path.push(APP_DIR);
        path.push("store.json");
        Ok(path)
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push(APP_DIR);
    path.push("config.yaml");
    Ok(path)
}

/// Loads `path`, or the default location when `None`. A missing file
/// yields the defaults.
pub async fn load_config(path: Option<&Path>) -> Result<AutofillConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        warn!("Config file not found, using defaults: {}", path.display());
        return Ok(AutofillConfig::default());
    }

    let content = fs::read_to_string(&path)
        .await
        .context("Failed to read config file")?;
    let config: AutofillConfig =
        serde_yaml::from_str(&content).context("Failed to parse config file")?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "pacing:\n  interFieldMs: 0\nchannel:\n  maxRetries: 4\nstorePath: /tmp/af.json\n",
        )
        .unwrap();

        let config = load_config(Some(path.as_path())).await.unwrap();

        assert_eq!(config.pacing.inter_field_ms, 0);
        assert_eq!(config.pacing.pre_focus_ms, 120);
        assert_eq!(config.channel.max_retries, 4);
        assert_eq!(config.channel.attach_settle_ms, 500);
        assert_eq!(config.store_path().unwrap(), PathBuf::from("/tmp/af.json"));
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(dir.path().join("absent.yaml").as_path()))
            .await
            .unwrap();
        assert_eq!(config, AutofillConfig::default());
    }

    #[tokio::test]
    async fn malformed_yaml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "pacing: [not, a, map]\n").unwrap();
        let err = load_config(Some(path.as_path())).await.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }
}
