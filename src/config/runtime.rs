// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::backends::PollingOptions;
use crate::config::consts::TOPIC_PLACEHOLDER;
use crate::config::{validate_config, EngineConfig};
use crate::engine::WorkflowEngine;
use crate::errors::ConfigError;
use crate::model::{StepCatalog, StepDisplay, StepId};
use crate::traits::GenerationGateway;

/// Resolved, validated engine settings.
///
/// Built from an [`EngineConfig`] with every default applied, so the engine never
/// has to look at optional fields.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    default_topic: String,
    thumbnail_title_template: String,
    timeouts: [Duration; 4],
    polling: PollingOptions,
    catalog: StepCatalog,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::resolve(&EngineConfig::default())
    }
}

impl EngineSettings {
    /// Validate `config` and resolve it into settings.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Invalid)?;
        Ok(Self::resolve(config))
    }

    fn resolve(config: &EngineConfig) -> Self {
        let timeouts = &config.executor_options.timeouts;

        let mut catalog = StepCatalog::default();
        for override_cfg in &config.steps {
            // Unknown ids were rejected by validation
            if let Ok(step) = StepId::from_str(&override_cfg.id) {
                let current = catalog.get(step).clone();
                catalog.set(
                    step,
                    StepDisplay {
                        title: override_cfg.title.clone().unwrap_or(current.title),
                        description: override_cfg
                            .description
                            .clone()
                            .unwrap_or(current.description),
                    },
                );
            }
        }

        Self {
            default_topic: config.get_default_topic().to_string(),
            thumbnail_title_template: config.get_thumbnail_title_template().to_string(),
            timeouts: StepId::ALL.map(|step| timeouts.for_step(step)),
            polling: PollingOptions::from(&config.polling),
            catalog,
        }
    }

    /// Trimmed `requested` topic, or the default topic when it is blank.
    pub fn resolve_topic(&self, requested: &str) -> String {
        let trimmed = requested.trim();
        if trimmed.is_empty() {
            self.default_topic.clone()
        } else {
            trimmed.to_string()
        }
    }

    /// Title handed to the thumbnail operation for `topic`.
    pub fn thumbnail_title(&self, topic: &str) -> String {
        self.thumbnail_title_template.replace(TOPIC_PLACEHOLDER, topic)
    }

    pub fn default_topic(&self) -> &str {
        &self.default_topic
    }

    pub fn timeout_for(&self, step: StepId) -> Duration {
        self.timeouts[step.index()]
    }

    /// Override one step's timeout.
    pub fn with_timeout(mut self, step: StepId, timeout: Duration) -> Self {
        self.timeouts[step.index()] = timeout;
        self
    }

    /// Polling options for gateways built alongside this engine.
    pub fn polling(&self) -> PollingOptions {
        self.polling
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }
}

/// Workflow engine builder - pairs resolved settings with a generation gateway.
///
/// # Examples
///
/// ## Building an engine from configuration
/// ```
/// use the_clapperboard::backends::ScriptedGateway;
/// use the_clapperboard::config::{EngineBuilder, EngineConfig};
///
/// let config = EngineConfig {
///     default_topic: Some("Dividend investing".to_string()),
///     ..EngineConfig::default()
/// };
///
/// let engine = EngineBuilder::from_config(&config)
///     .unwrap()
///     .with_gateway(ScriptedGateway::new())
///     .build()
///     .unwrap();
///
/// assert_eq!(engine.settings().resolve_topic("  "), "Dividend investing");
/// ```
#[derive(Default)]
pub struct EngineBuilder {
    settings: EngineSettings,
    gateway: Option<Arc<dyn GenerationGateway>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a validated configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            settings: EngineSettings::from_config(config)?,
            gateway: None,
        })
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_gateway<G>(self, gateway: G) -> Self
    where
        G: GenerationGateway + 'static,
    {
        self.with_shared_gateway(Arc::new(gateway))
    }

    /// Use a gateway the caller keeps a handle to.
    pub fn with_shared_gateway(mut self, gateway: Arc<dyn GenerationGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn build(self) -> Result<WorkflowEngine, ConfigError> {
        let gateway = self.gateway.ok_or(ConfigError::MissingGateway)?;
        Ok(WorkflowEngine::new(gateway, self.settings))
    }
}
