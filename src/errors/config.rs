// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Problems found while validating an engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The fallback topic is empty or whitespace.
    BlankDefaultTopic,
    /// The thumbnail title template does not reference the topic.
    MissingTopicPlaceholder {
        /// The offending template
        template: String,
    },
    /// A timeout or interval was configured as zero.
    ZeroDuration {
        /// Dotted path of the setting, e.g. `executor_options.timeouts.video_seconds`
        setting: String,
    },
    /// A step override names a step that is not part of the pipeline.
    UnknownStepId {
        /// The unrecognised id
        step_id: String,
    },
    /// Two step overrides target the same step.
    DuplicateStepId {
        /// The duplicated id
        step_id: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::BlankDefaultTopic => {
                write!(f, "default_topic must not be blank")
            }
            ValidationError::MissingTopicPlaceholder { template } => {
                write!(
                    f,
                    "thumbnail_title_template '{}' does not contain the {{topic}} placeholder",
                    template
                )
            }
            ValidationError::ZeroDuration { setting } => {
                write!(f, "'{}' must be greater than zero", setting)
            }
            ValidationError::UnknownStepId { step_id } => {
                write!(f, "Step override '{}' does not name a pipeline step", step_id)
            }
            ValidationError::DuplicateStepId { step_id } => {
                write!(f, "Duplicate step override: '{}'", step_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors from loading or building engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format '{0}' (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(String),

    #[error("Configuration validation failed:\n{}", join_lines(.0))]
    Invalid(Vec<ValidationError>),

    #[error("No generation gateway was supplied to the engine builder")]
    MissingGateway,
}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
