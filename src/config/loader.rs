// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_MAX_WAIT_SECONDS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SCRIPT_TIMEOUT_SECONDS,
    DEFAULT_SEO_TIMEOUT_SECONDS, DEFAULT_THUMBNAIL_TIMEOUT_SECONDS, DEFAULT_THUMBNAIL_TITLE_TEMPLATE,
    DEFAULT_TOPIC, DEFAULT_VIDEO_TIMEOUT_SECONDS,
};
use crate::errors::ConfigError;
use crate::model::StepId;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the workflow engine.
///
/// Every field is optional; an empty document yields the built-in defaults.
/// Configuration is usually loaded from a YAML or TOML file.
///
/// # Fields
/// * `default_topic` - Topic substituted for a blank request
/// * `thumbnail_title_template` - Title handed to the thumbnail operation; must contain `{topic}`
/// * `executor_options` - Per-step timeouts
/// * `polling` - Cadence and ceiling for long-running gateway jobs
/// * `steps` - Display overrides for individual steps
///
/// # Example
/// ```yaml
/// default_topic: "Index funds explained"
/// thumbnail_title_template: "Why {topic} beats stock picking"
/// executor_options:
///   timeouts:
///     video_seconds: 1200
/// polling:
///   interval_ms: 5000
/// steps:
///   - id: script
///     title: "1. Draft the Script"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub default_topic: Option<String>,
    pub thumbnail_title_template: Option<String>,
    #[serde(default)]
    pub executor_options: ExecutorOptions,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub steps: Vec<StepDisplayConfig>,
}

impl EngineConfig {
    pub fn get_default_topic(&self) -> &str {
        self.default_topic.as_deref().unwrap_or(DEFAULT_TOPIC)
    }

    pub fn get_thumbnail_title_template(&self) -> &str {
        self.thumbnail_title_template
            .as_deref()
            .unwrap_or(DEFAULT_THUMBNAIL_TITLE_TEMPLATE)
    }
}

/// Executor-specific configuration options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorOptions {
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Per-step timeouts in seconds.
///
/// A step whose gateway call outlives its timeout fails with
/// [`GatewayError::TimedOut`](crate::errors::GatewayError::TimedOut); it is not retried.
///
/// # Example
/// ```yaml
/// timeouts:
///   script_seconds: 60
///   video_seconds: 1800
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    pub script_seconds: Option<u64>,
    pub video_seconds: Option<u64>,
    pub thumbnail_seconds: Option<u64>,
    pub seo_seconds: Option<u64>,
}

impl TimeoutConfig {
    /// Configured seconds for `step`, falling back to the built-in default.
    pub fn get_seconds(&self, step: StepId) -> u64 {
        match step {
            StepId::Script => self.script_seconds.unwrap_or(DEFAULT_SCRIPT_TIMEOUT_SECONDS),
            StepId::Video => self.video_seconds.unwrap_or(DEFAULT_VIDEO_TIMEOUT_SECONDS),
            StepId::Thumbnail => self
                .thumbnail_seconds
                .unwrap_or(DEFAULT_THUMBNAIL_TIMEOUT_SECONDS),
            StepId::Seo => self.seo_seconds.unwrap_or(DEFAULT_SEO_TIMEOUT_SECONDS),
        }
    }

    pub fn for_step(&self, step: StepId) -> Duration {
        Duration::from_secs(self.get_seconds(step))
    }
}

/// Polling behaviour for long-running gateway jobs such as video rendering.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollingConfig {
    pub interval_ms: Option<u64>,
    pub max_wait_seconds: Option<u64>,
}

impl PollingConfig {
    pub fn get_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn get_max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_seconds.unwrap_or(DEFAULT_MAX_WAIT_SECONDS))
    }
}

/// Display override for one step. Missing fields keep the built-in text.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDisplayConfig {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Load a config from a YAML (`.yaml`, `.yml`) or TOML (`.toml`) file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => parse_yaml(&content),
        "toml" => Ok(toml::from_str(&content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_yaml(content: &str) -> Result<EngineConfig, ConfigError> {
    // serde_yaml rejects an empty document; treat it as "all defaults"
    if content.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Load and validate a config file.
///
/// Every validation problem is reported, not just the first.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
