// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The run driver: script first, then a fail-soft fan-out of video, thumbnail
//! and seo.
//!
//! ## Flow
//!
//! ```text
//! script ──► Completed ──┬─► video      ──┐
//!                        ├─► thumbnail  ──┼─► all settled ──► bundle or failure
//!                        └─► seo        ──┘
//! ```
//!
//! Each fan-out branch runs as its own task and reports back over a channel as a
//! [`StepEvent`]; only the driver writes to the run. A branch never aborts its
//! siblings. The driver itself runs under [`supervise`], which turns a panic or
//! an unexpected error into an `Error` on whichever steps were `Running` at the
//! time, so a run always ends terminal. Every task spawned here carries the
//! caller's run span.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::Instrument;

use crate::config::consts::VIDEO_INITIAL_PROGRESS;
use crate::config::EngineSettings;
use crate::engine::events::{BranchOutcome, StepEvent};
use crate::engine::store::RunStore;
use crate::errors::{ExecutionError, GatewayError};
use crate::model::{RunId, RunStatus, StepId, StepOutput, WorkflowRun};
use crate::observability::messages::engine::{OrchestrationFault, RunFailed, RunSucceeded};
use crate::observability::messages::step::{
    StepCompleted, StepFailed, StepProgressIgnored, StepProgressRecorded, StepStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{GenerationGateway, ProgressReporter};

/// Everything a driver needs for one run.
pub(crate) struct RunContext {
    pub(crate) run_id: RunId,
    pub(crate) topic: String,
    pub(crate) store: Arc<RunStore>,
    pub(crate) gateway: Arc<dyn GenerationGateway>,
    pub(crate) settings: Arc<EngineSettings>,
}

/// Drive a run to a terminal state, converting orchestration faults into step
/// and run errors.
///
/// Returns [`ExecutionError::Superseded`] when a newer run or a reset replaced
/// this one; nothing is written to the store in that case.
pub(crate) async fn supervise(ctx: RunContext) -> Result<RunStatus, ExecutionError> {
    let run_id = ctx.run_id;
    let store = Arc::clone(&ctx.store);

    let outcome = match tokio::spawn(drive(ctx).in_current_span()).await {
        Ok(outcome) => outcome,
        Err(join_error) => Err(ExecutionError::OrchestrationFault {
            message: panic_message(join_error),
        }),
    };

    match outcome {
        Ok(status) => Ok(status),
        Err(ExecutionError::Superseded(id)) => Err(ExecutionError::Superseded(id)),
        Err(error) => record_fault(&store, run_id, error.to_string()).await,
    }
}

/// Fail every step that is still `Running` with `message`, then fail the run.
async fn record_fault(
    store: &RunStore,
    run_id: RunId,
    message: String,
) -> Result<RunStatus, ExecutionError> {
    store
        .apply(run_id, "orchestration fault", |run| {
            if run.status().is_terminal() {
                return Ok(run.status());
            }
            let running = run.running_steps();
            OrchestrationFault {
                run_id,
                attributed_to: &running,
                message: &message,
            }
            .log();
            for step in &running {
                run.fail_step(*step, message.clone())?;
            }
            run.mark_failed(Some(message.clone()));
            log_run_failed(run);
            Ok(run.status())
        })
        .await
}

async fn drive(ctx: RunContext) -> Result<RunStatus, ExecutionError> {
    let started = Instant::now();

    let script = match run_script(&ctx).await? {
        Some(script) => script,
        None => return Ok(RunStatus::Failed),
    };

    let faults = fan_out(&ctx, script).await?;
    finish(&ctx, started, faults).await
}

/// Run the script step. `None` means it failed and the run is already marked failed.
async fn run_script(ctx: &RunContext) -> Result<Option<String>, ExecutionError> {
    let run_id = ctx.run_id;
    let step = StepId::Script;

    ctx.store
        .apply(run_id, "script start", |run| run.start_step(step, None))
        .await?;
    StepStarted { run_id, step }.log();

    let started = Instant::now();
    let outcome = with_timeout(
        step,
        ctx.settings.timeout_for(step),
        ctx.gateway.generate_script(&ctx.topic),
    )
    .await;

    match outcome {
        Ok(script) => {
            let output = StepOutput::Script(script.clone());
            ctx.store
                .apply(run_id, "script completed", |run| run.complete_step(output))
                .await?;
            StepCompleted {
                run_id,
                step,
                duration: started.elapsed(),
            }
            .log();
            Ok(Some(script))
        }
        Err(error) => {
            let message = error.to_string();
            StepFailed {
                run_id,
                step,
                error: &message,
            }
            .log();
            ctx.store
                .apply(run_id, "script failed", |run| {
                    run.fail_step(step, message.clone())?;
                    run.mark_failed(None);
                    log_run_failed(run);
                    Ok(())
                })
                .await?;
            Ok(None)
        }
    }
}

/// Launch the three dependent steps and apply their events until all settle.
///
/// Returns the messages of branches that faulted rather than failed normally.
async fn fan_out(ctx: &RunContext, script: String) -> Result<Vec<String>, ExecutionError> {
    let run_id = ctx.run_id;

    ctx.store
        .apply(run_id, "fan-out start", |run| {
            for step in StepId::FAN_OUT {
                let progress =
                    (step == StepId::Video).then(|| VIDEO_INITIAL_PROGRESS.to_string());
                run.start_step(step, progress)?;
            }
            Ok(())
        })
        .await?;

    let (events, mut inbox) = mpsc::unbounded_channel();
    let thumbnail_title = ctx.settings.thumbnail_title(&ctx.topic);
    for step in StepId::FAN_OUT {
        StepStarted { run_id, step }.log();
        let input = match step {
            StepId::Thumbnail => thumbnail_title.clone(),
            _ => script.clone(),
        };
        spawn_branch(
            step,
            input,
            Arc::clone(&ctx.gateway),
            ctx.settings.timeout_for(step),
            events.clone(),
        );
    }
    drop(events);

    let started = Instant::now();
    let mut unsettled = StepId::FAN_OUT.len();
    let mut faults = Vec::new();

    while unsettled > 0 {
        let Some(event) = inbox.recv().await else {
            return Err(ExecutionError::OrchestrationFault {
                message: "fan-out branches ended without settling".to_string(),
            });
        };

        match event {
            StepEvent::Progress { step, message } => {
                let recorded = ctx
                    .store
                    .apply(run_id, "progress", |run| {
                        Ok(run.record_progress(step, message.clone()))
                    })
                    .await?;
                if recorded {
                    StepProgressRecorded {
                        run_id,
                        step,
                        message: &message,
                    }
                    .log();
                } else {
                    StepProgressIgnored {
                        run_id,
                        step,
                        message: &message,
                    }
                    .log();
                }
            }
            StepEvent::Settled { step, outcome } => {
                unsettled -= 1;
                settle(ctx, step, outcome, started, &mut faults).await?;
            }
        }
    }

    Ok(faults)
}

async fn settle(
    ctx: &RunContext,
    step: StepId,
    outcome: BranchOutcome,
    started: Instant,
    faults: &mut Vec<String>,
) -> Result<(), ExecutionError> {
    let run_id = ctx.run_id;

    match outcome {
        BranchOutcome::Completed(output) => {
            ctx.store
                .apply(run_id, "step completed", |run| run.complete_step(output))
                .await?;
            StepCompleted {
                run_id,
                step,
                duration: started.elapsed(),
            }
            .log();
        }
        BranchOutcome::Failed(error) => {
            let message = error.to_string();
            ctx.store
                .apply(run_id, "step failed", |run| run.fail_step(step, message.clone()))
                .await?;
            StepFailed {
                run_id,
                step,
                error: &message,
            }
            .log();
        }
        BranchOutcome::Faulted(reason) => {
            let message = ExecutionError::OrchestrationFault { message: reason }.to_string();
            OrchestrationFault {
                run_id,
                attributed_to: &[step],
                message: &message,
            }
            .log();
            ctx.store
                .apply(run_id, "step fault", |run| run.fail_step(step, message.clone()))
                .await?;
            faults.push(message);
        }
    }

    Ok(())
}

/// Publish the bundle when every step completed, otherwise fail the run.
async fn finish(
    ctx: &RunContext,
    started: Instant,
    faults: Vec<String>,
) -> Result<RunStatus, ExecutionError> {
    let run_id = ctx.run_id;

    ctx.store
        .apply(run_id, "run finished", |run| {
            if run.failed_steps().is_empty() {
                let bundle = run.assemble_bundle()?;
                run.publish_bundle(bundle)?;
                RunSucceeded {
                    run_id,
                    duration: started.elapsed(),
                }
                .log();
            } else {
                run.mark_failed(faults.into_iter().next());
                log_run_failed(run);
            }
            Ok(run.status())
        })
        .await
}

/// Run one fan-out step on its own task and report how it ended.
///
/// The gateway call gets a task of its own so a panic inside it surfaces as a
/// [`JoinError`] here instead of silently losing the branch.
fn spawn_branch(
    step: StepId,
    input: String,
    gateway: Arc<dyn GenerationGateway>,
    timeout: Duration,
    events: mpsc::UnboundedSender<StepEvent>,
) {
    let progress_events = events.clone();
    let work = tokio::spawn(async move {
        match step {
            StepId::Video => {
                let progress = ProgressReporter::new(move |message| {
                    let _ = progress_events.send(StepEvent::Progress { step, message });
                });
                with_timeout(step, timeout, gateway.generate_video(&input, progress))
                    .await
                    .map(StepOutput::Video)
            }
            StepId::Thumbnail => with_timeout(step, timeout, gateway.generate_thumbnail(&input))
                .await
                .map(StepOutput::Thumbnail),
            StepId::Seo => with_timeout(step, timeout, gateway.generate_seo_metadata(&input))
                .await
                .map(StepOutput::Seo),
            StepId::Script => with_timeout(step, timeout, gateway.generate_script(&input))
                .await
                .map(StepOutput::Script),
        }
    }
    .in_current_span());

    tokio::spawn(async move {
        let outcome = match work.await {
            Ok(Ok(output)) => BranchOutcome::Completed(output),
            Ok(Err(error)) => BranchOutcome::Failed(error),
            Err(join_error) => BranchOutcome::Faulted(panic_message(join_error)),
        };
        // The driver is gone when the run was superseded
        let _ = events.send(StepEvent::Settled { step, outcome });
    }
    .in_current_span());
}

async fn with_timeout<T, F>(step: StepId, after: Duration, operation: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(after, operation).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::TimedOut {
            operation: format!("{} generation", step),
            after,
        }),
    }
}

fn log_run_failed(run: &WorkflowRun) {
    if let Some(failure) = run.failure() {
        RunFailed {
            run_id: run.id(),
            failed_steps: &failure.failed_steps,
            fault: failure.fault.as_deref(),
        }
        .log();
    }
}

/// Describe why a task ended without returning.
pub(crate) fn panic_message(error: JoinError) -> String {
    if error.is_cancelled() {
        return "task was cancelled".to_string();
    }
    match error.try_into_panic() {
        Ok(payload) => format!("task panicked: {}", describe_panic(payload.as_ref())),
        Err(_) => "task failed".to_string(),
    }
}

fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
