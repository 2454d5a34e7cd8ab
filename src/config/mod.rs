use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stt: SttConfig,
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// WebSocket endpoint of the realtime speech service.
    pub url: String,
    /// Spoken language tag sent with the start action (e.g. "ko").
    /// Also selects the sentence completeness policy for reconciliation.
    pub language: String,
    /// Capture sample rate in Hz. The speech service expects 16 kHz mono s16le.
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the meeting backend that owns meeting metadata and
    /// receives the finished transcript.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Speaker identity used when the speech service attributes none and the
    /// meeting has no participants.
    pub fallback_speaker: String,
    /// Grace period in milliseconds after the stop action, giving the speech
    /// service time to emit its trailing upload/done messages.
    pub stop_grace_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Port for the local control API.
    pub port: u16,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000/ws/realtime".to_string(),
            language: "ko".to_string(),
            sample_rate: 16000,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fallback_speaker: "화자".to_string(),
            stop_grace_ms: 500,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 4646 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
