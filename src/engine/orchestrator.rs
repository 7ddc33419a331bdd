// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::EngineSettings;
use crate::engine::driver::{panic_message, supervise, RunContext};
use crate::engine::store::RunStore;
use crate::errors::ExecutionError;
use crate::model::{RunId, RunStatus, StepId, StepOutput, WorkflowRun};
use crate::observability::messages::engine::{RunReset, RunStarted};
use crate::observability::messages::step::StepResultEdited;
use crate::observability::messages::StructuredLog;
use crate::traits::GenerationGateway;

/// The workflow engine: the only writer of run state.
///
/// Callers start runs, read snapshots, overwrite step results and reset. All
/// state lives behind a single store; snapshots are clones and never observe a
/// half-applied change. Cloning the engine is cheap and every clone shares the
/// same current run.
///
/// Starting a run while another is in flight supersedes it: the old run keeps
/// its gateway calls going, but nothing they produce is applied anymore.
///
/// # Example
/// ```
/// use the_clapperboard::backends::ScriptedGateway;
/// use the_clapperboard::config::EngineBuilder;
/// use the_clapperboard::model::RunStatus;
///
/// # #[tokio::main]
/// # async fn main() {
/// let engine = EngineBuilder::new()
///     .with_gateway(ScriptedGateway::new())
///     .build()
///     .unwrap();
///
/// let status = engine.start_run("").await.wait().await.unwrap();
/// assert_eq!(status, RunStatus::Succeeded);
///
/// let run = engine.snapshot().await;
/// assert_eq!(run.topic(), "Top 5 Passive Income Streams for Beginners");
/// assert!(run.asset_bundle().is_some());
/// # }
/// ```
#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<RunStore>,
    gateway: Arc<dyn GenerationGateway>,
    settings: Arc<EngineSettings>,
}

/// Awaitable handle to a started run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    task: JoinHandle<Result<RunStatus, ExecutionError>>,
}

impl RunHandle {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Wait for the run to end.
    ///
    /// Resolves to the terminal [`RunStatus`], or [`ExecutionError::Superseded`]
    /// if a newer run or a reset replaced this one first.
    pub async fn wait(self) -> Result<RunStatus, ExecutionError> {
        match self.task.await {
            Ok(result) => result,
            Err(join_error) => Err(ExecutionError::OrchestrationFault {
                message: panic_message(join_error),
            }),
        }
    }
}

impl WorkflowEngine {
    pub fn new(gateway: Arc<dyn GenerationGateway>, settings: EngineSettings) -> Self {
        Self {
            store: Arc::new(RunStore::new(settings.catalog())),
            gateway,
            settings: Arc::new(settings),
        }
    }

    /// Start a new run for `topic`; a blank topic becomes the default topic.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start_run(&self, topic: &str) -> RunHandle {
        let topic = self.settings.resolve_topic(topic);
        let run_id = self
            .store
            .begin(topic.clone(), self.settings.catalog())
            .await;

        let started = RunStarted {
            run_id,
            topic: &topic,
            gateway: self.gateway.name(),
        };
        started.log();
        let span = started.span("workflow_run");

        let ctx = RunContext {
            run_id,
            topic,
            store: Arc::clone(&self.store),
            gateway: Arc::clone(&self.gateway),
            settings: Arc::clone(&self.settings),
        };

        RunHandle {
            run_id,
            task: tokio::spawn(supervise(ctx).instrument(span)),
        }
    }

    /// Copy of the current run.
    pub async fn snapshot(&self) -> WorkflowRun {
        self.store.snapshot().await
    }

    /// Overwrite `step`'s result on the current run.
    ///
    /// Status, error and progress are left alone, whatever the step's state, and
    /// no other step is re-run. A published bundle keeps the result it was built from.
    pub async fn edit_step_result(
        &self,
        step: StepId,
        content: StepOutput,
    ) -> Result<(), ExecutionError> {
        if content.step() != step {
            return Err(ExecutionError::OutputMismatch {
                step,
                found: content.step(),
            });
        }
        let run_id = self.store.edit(content).await?;
        StepResultEdited { run_id, step }.log();
        Ok(())
    }

    /// Replace the script text on the current run.
    pub async fn edit_script(&self, script: impl Into<String>) -> Result<(), ExecutionError> {
        self.edit_step_result(StepId::Script, StepOutput::Script(script.into()))
            .await
    }

    /// Return to an idle workflow with every step pending and no topic.
    pub async fn reset_run(&self) {
        let run_id = self.store.reset(self.settings.catalog()).await;
        RunReset { run_id }.log();
    }

    /// Receive the current run now and again after every change.
    ///
    /// Every change is queued as a full snapshot on an unbounded channel. Drain
    /// the receiver, or drop it to unsubscribe.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<WorkflowRun> {
        self.store.subscribe().await
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}
