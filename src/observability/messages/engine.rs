// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for run lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Run start, success and failure
//! * Runs being reset or superseded
//! * Events discarded because they belong to a superseded run
//! * Orchestration faults outside any gateway call

use std::fmt::{Display, Formatter};

use tracing::Span;

use crate::model::{RunId, StepId};
use crate::observability::messages::StructuredLog;

/// A new run was started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunStarted<'a> {
    pub run_id: RunId,
    pub topic: &'a str,
    pub gateway: &'a str,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting {} for topic \"{}\" using the {} gateway",
            self.run_id, self.topic, self.gateway
        )
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = %self.run_id,
            topic = self.topic,
            gateway = self.gateway,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            run_id = %self.run_id,
            topic = self.topic,
        )
    }
}

/// Every step completed and the asset bundle was published.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunSucceeded {
    pub run_id: RunId,
    pub duration: std::time::Duration,
}

impl Display for RunSucceeded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} completed, asset bundle published in {:?}",
            self.run_id, self.duration
        )
    }
}

impl StructuredLog for RunSucceeded {
    fn log(&self) {
        tracing::info!(
            run_id = %self.run_id,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_succeeded",
            span_name = name,
            run_id = %self.run_id,
            duration = ?self.duration,
        )
    }
}

/// The run ended without a bundle.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct RunFailed<'a> {
    pub run_id: RunId,
    pub failed_steps: &'a [StepId],
    pub fault: Option<&'a str>,
}

impl Display for RunFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let steps: Vec<&str> = self.failed_steps.iter().map(|s| s.as_str()).collect();
        write!(f, "{} failed: steps in error [{}]", self.run_id, steps.join(", "))?;
        if let Some(fault) = self.fault {
            write!(f, ", fault: {}", fault)?;
        }
        Ok(())
    }
}

impl StructuredLog for RunFailed<'_> {
    fn log(&self) {
        tracing::error!(
            run_id = %self.run_id,
            failed_steps = ?self.failed_steps,
            fault = self.fault,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "run_failed",
            span_name = name,
            run_id = %self.run_id,
            failed_steps = ?self.failed_steps,
        )
    }
}

/// A run was replaced by a newer run or a reset while still in flight.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunSuperseded {
    pub run_id: RunId,
    pub replaced_by: RunId,
}

impl Display for RunSuperseded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} superseded by {}; its late results will be discarded",
            self.run_id, self.replaced_by
        )
    }
}

impl StructuredLog for RunSuperseded {
    fn log(&self) {
        tracing::info!(
            run_id = %self.run_id,
            replaced_by = %self.replaced_by,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_superseded",
            span_name = name,
            run_id = %self.run_id,
            replaced_by = %self.replaced_by,
        )
    }
}

/// The workflow was reset to its initial state.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunReset {
    pub run_id: RunId,
}

impl Display for RunReset {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Workflow reset; {} is idle", self.run_id)
    }
}

impl StructuredLog for RunReset {
    fn log(&self) {
        tracing::info!(run_id = %self.run_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("run_reset", span_name = name, run_id = %self.run_id)
    }
}

/// An event for a run that is no longer current was dropped.
///
/// # Log Level
/// `debug!` - Expected after a new run starts; not an error
pub struct StaleEventDiscarded<'a> {
    pub run_id: RunId,
    pub current: RunId,
    pub event: &'a str,
}

impl Display for StaleEventDiscarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Discarding {} from {} (current run is {})",
            self.event, self.run_id, self.current
        )
    }
}

impl StructuredLog for StaleEventDiscarded<'_> {
    fn log(&self) {
        tracing::debug!(
            run_id = %self.run_id,
            current = %self.current,
            event = self.event,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stale_event",
            span_name = name,
            run_id = %self.run_id,
            current = %self.current,
        )
    }
}

/// Something outside a gateway call went wrong while driving a run.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct OrchestrationFault<'a> {
    pub run_id: RunId,
    pub attributed_to: &'a [StepId],
    pub message: &'a str,
}

impl Display for OrchestrationFault<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.attributed_to.is_empty() {
            write!(f, "Unattributed orchestration fault in {}: {}", self.run_id, self.message)
        } else {
            let steps: Vec<&str> = self.attributed_to.iter().map(|s| s.as_str()).collect();
            write!(
                f,
                "Orchestration fault in {} attributed to [{}]: {}",
                self.run_id,
                steps.join(", "),
                self.message
            )
        }
    }
}

impl StructuredLog for OrchestrationFault<'_> {
    fn log(&self) {
        tracing::error!(
            run_id = %self.run_id,
            attributed_to = ?self.attributed_to,
            fault = self.message,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "orchestration_fault",
            span_name = name,
            run_id = %self.run_id,
        )
    }
}
