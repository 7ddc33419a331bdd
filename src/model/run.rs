// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! One execution of the pipeline for one topic.

use std::fmt;

use serde::Serialize;

use crate::errors::ExecutionError;
use crate::model::assets::AssetBundle;
use crate::model::step::{StepCatalog, StepId, StepOutput, StepStatus, WorkflowStep};

/// Monotonically increasing identity of a run within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RunId(u64);

impl RunId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Aggregate status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Fresh workflow that has not been started (after construction or reset).
    Idle,
    Running,
    /// Every step completed and the bundle was published.
    Succeeded,
    /// At least one step errored, or an orchestration fault ended the run.
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }
}

/// Why a run failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    /// Steps in `Error`, in pipeline order.
    pub failed_steps: Vec<StepId>,
    /// Orchestration fault message, when the failure did not come from a gateway call.
    pub fault: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowRun {
    id: RunId,
    topic: String,
    status: RunStatus,
    steps: Vec<WorkflowStep>,
    asset_bundle: Option<AssetBundle>,
    failure: Option<RunFailure>,
    #[serde(skip)]
    clock: u64,
}

impl WorkflowRun {
    pub(crate) fn new(id: RunId, topic: String, status: RunStatus, catalog: &StepCatalog) -> Self {
        Self {
            id,
            topic,
            status,
            steps: StepId::ALL
                .iter()
                .map(|step| WorkflowStep::pending(*step, catalog.get(*step)))
                .collect(),
            asset_bundle: None,
            failure: None,
            clock: 0,
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    /// Resolved topic (the default topic when the request was blank).
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Steps in pipeline order.
    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn step(&self, step: StepId) -> &WorkflowStep {
        &self.steps[step.index()]
    }

    pub fn asset_bundle(&self) -> Option<&AssetBundle> {
        self.asset_bundle.as_ref()
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        self.failure.as_ref()
    }

    pub fn running_steps(&self) -> Vec<StepId> {
        self.steps_with(StepStatus::Running)
    }

    pub fn failed_steps(&self) -> Vec<StepId> {
        self.steps_with(StepStatus::Error)
    }

    fn steps_with(&self, status: StepStatus) -> Vec<StepId> {
        self.steps
            .iter()
            .filter(|s| s.status() == status)
            .map(|s| s.id())
            .collect()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Move `step` to `Running`; every step it depends on must be `Completed`.
    pub(crate) fn start_step(&mut self, step: StepId, progress: Option<String>) -> Result<u64, ExecutionError> {
        if let Some(dependency) = step
            .depends_on()
            .iter()
            .copied()
            .find(|dependency| self.step(*dependency).status() != StepStatus::Completed)
        {
            return Err(ExecutionError::DependencyNotCompleted { step, dependency });
        }
        let seq = self.tick();
        self.steps[step.index()].start(seq, progress)?;
        Ok(seq)
    }

    pub(crate) fn complete_step(&mut self, output: StepOutput) -> Result<u64, ExecutionError> {
        let seq = self.tick();
        let step = output.step();
        self.steps[step.index()].complete(output, seq)?;
        Ok(seq)
    }

    pub(crate) fn fail_step(&mut self, step: StepId, message: String) -> Result<u64, ExecutionError> {
        let seq = self.tick();
        self.steps[step.index()].fail(message, seq)?;
        Ok(seq)
    }

    pub(crate) fn record_progress(&mut self, step: StepId, message: String) -> bool {
        self.steps[step.index()].record_progress(message)
    }

    pub(crate) fn overwrite_result(&mut self, output: StepOutput) -> Result<(), ExecutionError> {
        let step = output.step();
        self.steps[step.index()].overwrite_result(output)
    }

    /// Build the bundle from the four step results, exactly as stored.
    pub(crate) fn assemble_bundle(&self) -> Result<AssetBundle, ExecutionError> {
        let script = match self.step(StepId::Script).result() {
            Some(StepOutput::Script(script)) => script.clone(),
            _ => return Err(ExecutionError::MissingResult(StepId::Script)),
        };
        let video = match self.step(StepId::Video).result() {
            Some(StepOutput::Video(video)) => video.clone(),
            _ => return Err(ExecutionError::MissingResult(StepId::Video)),
        };
        let thumbnail = match self.step(StepId::Thumbnail).result() {
            Some(StepOutput::Thumbnail(thumbnail)) => thumbnail.clone(),
            _ => return Err(ExecutionError::MissingResult(StepId::Thumbnail)),
        };
        let seo = match self.step(StepId::Seo).result() {
            Some(StepOutput::Seo(seo)) => seo.clone(),
            _ => return Err(ExecutionError::MissingResult(StepId::Seo)),
        };
        Ok(AssetBundle::new(script, video, thumbnail, seo))
    }

    /// Publish the bundle. Only valid once, and only when every step completed.
    pub(crate) fn publish_bundle(&mut self, bundle: AssetBundle) -> Result<(), ExecutionError> {
        if self.asset_bundle.is_some() {
            return Err(ExecutionError::BundleAlreadyPublished(self.id));
        }
        if let Some(step) = self
            .steps
            .iter()
            .find(|s| s.status() != StepStatus::Completed)
        {
            return Err(ExecutionError::MissingResult(step.id()));
        }
        self.asset_bundle = Some(bundle);
        self.status = RunStatus::Succeeded;
        Ok(())
    }

    pub(crate) fn mark_failed(&mut self, fault: Option<String>) {
        self.status = RunStatus::Failed;
        self.failure = Some(RunFailure {
            failed_steps: self.failed_steps(),
            fault,
        });
    }
}
