// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation for the workflow engine.
//!
//! Validation runs every check and returns all problems together, so a broken
//! config file can be fixed in one pass.
//!
//! # Checks
//!
//! 1. **Topic**: the fallback topic must not be blank
//! 2. **Template**: the thumbnail title template must contain `{topic}`
//! 3. **Durations**: configured timeouts and polling values must be non-zero
//! 4. **Step overrides**: every override names a pipeline step, at most once
//!
//! # Examples
//!
//! ```rust
//! use the_clapperboard::config::{validate_config, EngineConfig};
//! use the_clapperboard::errors::ValidationError;
//!
//! let config = EngineConfig {
//!     default_topic: Some("   ".to_string()),
//!     ..EngineConfig::default()
//! };
//!
//! let errors = validate_config(&config).unwrap_err();
//! assert_eq!(errors, vec![ValidationError::BlankDefaultTopic]);
//! ```

use std::collections::HashSet;
use std::str::FromStr;

use crate::config::consts::TOPIC_PLACEHOLDER;
use crate::config::EngineConfig;
use crate::errors::ValidationError;
use crate::model::StepId;

/// Validate an engine configuration, collecting every problem found.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.get_default_topic().trim().is_empty() {
        errors.push(ValidationError::BlankDefaultTopic);
    }

    let template = config.get_thumbnail_title_template();
    if !template.contains(TOPIC_PLACEHOLDER) {
        errors.push(ValidationError::MissingTopicPlaceholder {
            template: template.to_string(),
        });
    }

    validate_durations(config, &mut errors);
    validate_step_overrides(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_durations(config: &EngineConfig, errors: &mut Vec<ValidationError>) {
    let timeouts = &config.executor_options.timeouts;
    let settings = [
        ("executor_options.timeouts.script_seconds", timeouts.script_seconds),
        ("executor_options.timeouts.video_seconds", timeouts.video_seconds),
        ("executor_options.timeouts.thumbnail_seconds", timeouts.thumbnail_seconds),
        ("executor_options.timeouts.seo_seconds", timeouts.seo_seconds),
        ("polling.interval_ms", config.polling.interval_ms),
        ("polling.max_wait_seconds", config.polling.max_wait_seconds),
    ];

    for (setting, value) in settings {
        if value == Some(0) {
            errors.push(ValidationError::ZeroDuration {
                setting: setting.to_string(),
            });
        }
    }
}

fn validate_step_overrides(config: &EngineConfig, errors: &mut Vec<ValidationError>) {
    let mut seen: HashSet<StepId> = HashSet::new();

    for override_cfg in &config.steps {
        match StepId::from_str(&override_cfg.id) {
            Ok(step) => {
                if !seen.insert(step) {
                    errors.push(ValidationError::DuplicateStepId {
                        step_id: override_cfg.id.clone(),
                    });
                }
            }
            Err(_) => errors.push(ValidationError::UnknownStepId {
                step_id: override_cfg.id.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExecutorOptions, PollingConfig, StepDisplayConfig, TimeoutConfig};

    fn step_override(id: &str) -> StepDisplayConfig {
        StepDisplayConfig {
            id: id.to_string(),
            title: Some(format!("{} title", id)),
            description: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_template_without_placeholder() {
        let config = EngineConfig {
            thumbnail_title_template: Some("Passive income".to_string()),
            ..EngineConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::MissingTopicPlaceholder {
                template: "Passive income".to_string()
            }]
        );
    }

    #[test]
    fn test_zero_durations_are_named() {
        let config = EngineConfig {
            executor_options: ExecutorOptions {
                timeouts: TimeoutConfig {
                    video_seconds: Some(0),
                    ..TimeoutConfig::default()
                },
            },
            polling: PollingConfig {
                interval_ms: Some(0),
                max_wait_seconds: Some(60),
            },
            ..EngineConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::ZeroDuration {
            setting: "executor_options.timeouts.video_seconds".to_string()
        }));
        assert!(errors.contains(&ValidationError::ZeroDuration {
            setting: "polling.interval_ms".to_string()
        }));
    }

    #[test]
    fn test_step_overrides_must_be_known_and_unique() {
        let config = EngineConfig {
            steps: vec![
                step_override("script"),
                step_override("music"),
                step_override("script"),
                step_override("seo"),
            ],
            ..EngineConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::UnknownStepId {
                    step_id: "music".to_string()
                },
                ValidationError::DuplicateStepId {
                    step_id: "script".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_all_errors_are_collected() {
        let config = EngineConfig {
            default_topic: Some(String::new()),
            thumbnail_title_template: Some("no placeholder".to_string()),
            steps: vec![step_override("narration")],
            ..EngineConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], ValidationError::BlankDefaultTopic);
    }
}
