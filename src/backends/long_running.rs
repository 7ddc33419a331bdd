// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Polling support for long-running generation jobs.
//!
//! Video rendering is submitted as a job and then refreshed until the provider
//! reports it done. [`poll_to_completion`] owns that loop and turns it into
//! progress messages for the engine:
//!
//! ```text
//! "Crafting video concept..."                          before submission
//! "AI is rendering your video... ..."                  after submission
//! "Rendering in progress... (0.2 mins elapsed). ..."   after every wait
//! "Fetching final video file..."                       once the job is done
//! ```
//!
//! A failed refresh is logged and the loop keeps going. The job is given up on
//! when the provider rejects the submission, reports completion without an
//! output, the finished output cannot be fetched, or `max_wait` elapses.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::config::PollingConfig;
use crate::errors::GatewayError;
use crate::observability::messages::gateway::{PollCompleted, PollRefreshFailed};
use crate::observability::messages::StructuredLog;
use crate::traits::ProgressReporter;

pub const CRAFTING_PROGRESS: &str = "Crafting video concept...";
pub const RENDERING_PROGRESS: &str = "AI is rendering your video... this can take a few minutes.";
pub const FETCHING_PROGRESS: &str = "Fetching final video file...";
pub const MISSING_VIDEO_REFERENCE: &str =
    "Video generation completed, but no video URI was found.";

/// What the provider last said about a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState<T> {
    /// Still working.
    Running,
    /// Done; `None` when the provider finished without producing an output.
    Finished(Option<T>),
}

/// Provider-side handle to a long-running job.
#[async_trait]
pub trait LongRunningJob: Send {
    type Output: Send;

    /// Kick the job off. An error here is a rejection and ends the operation.
    async fn submit(&mut self) -> Result<JobState<Self::Output>, GatewayError>;

    /// Ask the provider for the current state. Errors are treated as transient.
    async fn refresh(&mut self) -> Result<JobState<Self::Output>, GatewayError>;

    /// Download the finished output. Jobs whose output needs no transfer keep the default.
    async fn fetch(&mut self, output: Self::Output) -> Result<Self::Output, GatewayError> {
        Ok(output)
    }

    /// Human-readable operation name used in logs and timeout errors.
    fn operation(&self) -> &str;
}

/// Cadence and ceiling for [`poll_to_completion`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollingOptions {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl PollingOptions {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollingOptions {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: config.get_interval(),
            max_wait: config.get_max_wait(),
        }
    }
}

/// Progress text reported after `polls` waits of `interval` each.
pub fn elapsed_progress(polls: u32, interval: Duration) -> String {
    let minutes = interval.as_secs_f64() * f64::from(polls) / 60.0;
    format!(
        "Rendering in progress... ({:.1} mins elapsed). The AI is working hard!",
        minutes
    )
}

/// Submit `job`, refresh it every `options.interval` until it finishes, then
/// fetch its output.
pub async fn poll_to_completion<J>(
    job: &mut J,
    progress: &ProgressReporter,
    options: PollingOptions,
) -> Result<J::Output, GatewayError>
where
    J: LongRunningJob,
{
    progress.report(CRAFTING_PROGRESS);
    let mut state = job.submit().await?;
    progress.report(RENDERING_PROGRESS);

    let started = Instant::now();
    let mut polls: u32 = 0;

    loop {
        if let JobState::Finished(output) = state {
            PollCompleted {
                operation: job.operation(),
                polls,
                elapsed: started.elapsed(),
            }
            .log();
            let output = output.ok_or_else(|| {
                GatewayError::MissingReference(MISSING_VIDEO_REFERENCE.to_string())
            })?;
            progress.report(FETCHING_PROGRESS);
            return job.fetch(output).await;
        }

        if started.elapsed() >= options.max_wait {
            return Err(GatewayError::TimedOut {
                operation: job.operation().to_string(),
                after: options.max_wait,
            });
        }

        tokio::time::sleep(options.interval).await;
        polls += 1;
        progress.report(elapsed_progress(polls, options.interval));

        match job.refresh().await {
            Ok(next) => state = next,
            Err(error) => {
                let error = error.to_string();
                PollRefreshFailed {
                    operation: job.operation(),
                    attempt: polls,
                    error: &error,
                }
                .log();
                state = JobState::Running;
            }
        }
    }
}
