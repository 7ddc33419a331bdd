// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for long-running gateway jobs.

use std::fmt::{Display, Formatter};

use tracing::Span;

use crate::observability::messages::StructuredLog;

/// Refreshing a job handle failed; polling continues.
///
/// # Log Level
/// `warn!` - Transient, the next poll may succeed
///
/// # Example
/// ```
/// use the_clapperboard::observability::messages::gateway::PollRefreshFailed;
///
/// let msg = PollRefreshFailed {
///     operation: "video generation",
///     attempt: 2,
///     error: "503 Service Unavailable",
/// };
///
/// assert!(msg.to_string().contains("attempt 2"));
/// ```
pub struct PollRefreshFailed<'a> {
    pub operation: &'a str,
    pub attempt: u32,
    pub error: &'a str,
}

impl Display for PollRefreshFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Polling {} failed on attempt {} (will keep polling): {}",
            self.operation, self.attempt, self.error
        )
    }
}

impl StructuredLog for PollRefreshFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            operation = self.operation,
            attempt = self.attempt,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "poll_refresh_failed",
            span_name = name,
            operation = self.operation,
            attempt = self.attempt,
        )
    }
}

/// A long-running job reported completion.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PollCompleted<'a> {
    pub operation: &'a str,
    pub polls: u32,
    pub elapsed: std::time::Duration,
}

impl Display for PollCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} finished after {} polls ({:?})",
            self.operation, self.polls, self.elapsed
        )
    }
}

impl StructuredLog for PollCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            operation = self.operation,
            polls = self.polls,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "poll_completed",
            span_name = name,
            operation = self.operation,
            polls = self.polls,
        )
    }
}
