// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    pub step_secs: u64,
    pub segment_secs: u64,
    pub start_secs: u64,
    /// Fixed wait after every segment, independent of retry backoff.
    pub politeness_delay_ms: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            step_secs: 30,
            segment_secs: 18,
            start_secs: 0,
            politeness_delay_ms: 3000,
        }
    }
}

impl ScanSettings {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionSettings {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    pub retry: RetrySettings,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.audd.io".to_string(),
            api_token: None,
            timeout_secs: 30,
            retry: RetrySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsSettings {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub yt_dlp: String,
    pub download_timeout_secs: u64,
    pub title_timeout_secs: u64,
}

impl Default for ToolsSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            yt_dlp: "yt-dlp".to_string(),
            download_timeout_secs: 600,
            title_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub scan: ScanSettings,
    pub recognition: RecognitionSettings,
    pub tools: ToolsSettings,
    pub telemetry: TelemetryConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: MIXID_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("MIXID_").split("__"));

    let config: AppConfig = figment.extract()?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}
