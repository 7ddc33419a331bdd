// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for step transitions, progress updates and result edits.

use std::fmt::{Display, Formatter};

use tracing::Span;

use crate::model::{RunId, StepId};
use crate::observability::messages::StructuredLog;

/// Step moved from `Pending` to `Running`.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StepStarted {
    pub run_id: RunId,
    pub step: StepId,
}

impl Display for StepStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step '{}' started in {}", self.step, self.run_id)
    }
}

impl StructuredLog for StepStarted {
    fn log(&self) {
        tracing::info!(run_id = %self.run_id, step = %self.step, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "step",
            span_name = name,
            run_id = %self.run_id,
            step = %self.step,
        )
    }
}

/// Step completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StepCompleted {
    pub run_id: RunId,
    pub step: StepId,
    pub duration: std::time::Duration,
}

impl Display for StepCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' completed in {} after {:?}",
            self.step, self.run_id, self.duration
        )
    }
}

impl StructuredLog for StepCompleted {
    fn log(&self) {
        tracing::info!(
            run_id = %self.run_id,
            step = %self.step,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "step_completed",
            span_name = name,
            run_id = %self.run_id,
            step = %self.step,
            duration = ?self.duration,
        )
    }
}

/// Step failed; the gateway error message is stored on the step.
///
/// # Log Level
/// `warn!` - Step-local failure, siblings keep running
pub struct StepFailed<'a> {
    pub run_id: RunId,
    pub step: StepId,
    pub error: &'a str,
}

impl Display for StepFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step '{}' failed in {}: {}", self.step, self.run_id, self.error)
    }
}

impl StructuredLog for StepFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            run_id = %self.run_id,
            step = %self.step,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "step_failed",
            span_name = name,
            run_id = %self.run_id,
            step = %self.step,
        )
    }
}

/// Latest progress message stored against a running step.
///
/// # Log Level
/// `debug!` - Frequent during long-running operations
pub struct StepProgressRecorded<'a> {
    pub run_id: RunId,
    pub step: StepId,
    pub message: &'a str,
}

impl Display for StepProgressRecorded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step '{}' progress: {}", self.step, self.message)
    }
}

impl StructuredLog for StepProgressRecorded<'_> {
    fn log(&self) {
        tracing::debug!(
            run_id = %self.run_id,
            step = %self.step,
            progress = self.message,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "step_progress",
            span_name = name,
            run_id = %self.run_id,
            step = %self.step,
        )
    }
}

/// A progress message arrived after its step left `Running`.
///
/// # Log Level
/// `debug!`
pub struct StepProgressIgnored<'a> {
    pub run_id: RunId,
    pub step: StepId,
    pub message: &'a str,
}

impl Display for StepProgressIgnored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring progress for step '{}' which is no longer running: {}",
            self.step, self.message
        )
    }
}

impl StructuredLog for StepProgressIgnored<'_> {
    fn log(&self) {
        tracing::debug!(run_id = %self.run_id, step = %self.step, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "step_progress_ignored",
            span_name = name,
            run_id = %self.run_id,
            step = %self.step,
        )
    }
}

/// A step's result was overwritten by the user.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StepResultEdited {
    pub run_id: RunId,
    pub step: StepId,
}

impl Display for StepResultEdited {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Result of step '{}' edited in {}; dependent steps are not re-run",
            self.step, self.run_id
        )
    }
}

impl StructuredLog for StepResultEdited {
    fn log(&self) {
        tracing::info!(run_id = %self.run_id, step = %self.step, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "step_result_edited",
            span_name = name,
            run_id = %self.run_id,
            step = %self.step,
        )
    }
}
