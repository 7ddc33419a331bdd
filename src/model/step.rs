// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipeline steps and their per-run state machine.
//!
//! Every step moves through `Pending -> Running -> {Completed | Error}` exactly once
//! per run. The transition methods on [`WorkflowStep`] are the only way the engine
//! changes a step, so the invariants live here rather than in the driver:
//!
//! * `Running` is entered at most once per run.
//! * `result` is written on the transition into `Completed`, `error` on the
//!   transition into `Error`; the engine never writes both.
//! * `progress_message` only changes while the step is `Running`.
//!
//! The membership of a run is fixed (script, video, thumbnail, seo) and so is the
//! dependency DAG: `script` has no dependencies and the other three depend only on it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ExecutionError;
use crate::model::assets::{ImageRef, SeoMetadata, VideoRef};

/// Identifier of one pipeline stage.
///
/// Declaration order is pipeline order, which is also the order steps appear in a
/// [`WorkflowRun`](crate::model::WorkflowRun) snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Script,
    Video,
    Thumbnail,
    Seo,
}

impl StepId {
    /// All steps in pipeline order.
    pub const ALL: [StepId; 4] = [StepId::Script, StepId::Video, StepId::Thumbnail, StepId::Seo];

    /// Steps that run concurrently once `script` has completed.
    pub const FAN_OUT: [StepId; 3] = [StepId::Video, StepId::Thumbnail, StepId::Seo];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Script => "script",
            StepId::Video => "video",
            StepId::Thumbnail => "thumbnail",
            StepId::Seo => "seo",
        }
    }

    /// Steps that must be `Completed` before this one may start.
    pub fn depends_on(&self) -> &'static [StepId] {
        match self {
            StepId::Script => &[],
            StepId::Video | StepId::Thumbnail | StepId::Seo => &[StepId::Script],
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            StepId::Script => 0,
            StepId::Video => 1,
            StepId::Thumbnail => 2,
            StepId::Seo => 3,
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "script" => Ok(StepId::Script),
            "video" => Ok(StepId::Video),
            "thumbnail" => Ok(StepId::Thumbnail),
            "seo" => Ok(StepId::Seo),
            other => Err(ExecutionError::UnknownStep(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Error)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Payload produced by a step. Each variant belongs to exactly one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StepOutput {
    Script(String),
    Video(VideoRef),
    Thumbnail(ImageRef),
    Seo(SeoMetadata),
}

impl StepOutput {
    /// The step this payload belongs to.
    pub fn step(&self) -> StepId {
        match self {
            StepOutput::Script(_) => StepId::Script,
            StepOutput::Video(_) => StepId::Video,
            StepOutput::Thumbnail(_) => StepId::Thumbnail,
            StepOutput::Seo(_) => StepId::Seo,
        }
    }

    fn ensure_belongs_to(&self, step: StepId) -> Result<(), ExecutionError> {
        if self.step() == step {
            Ok(())
        } else {
            Err(ExecutionError::OutputMismatch {
                step,
                found: self.step(),
            })
        }
    }
}

/// Static display metadata for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDisplay {
    pub title: String,
    pub description: String,
}

/// Display metadata for every step, indexed by [`StepId`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepCatalog {
    entries: [StepDisplay; 4],
}

impl StepCatalog {
    pub fn get(&self, step: StepId) -> &StepDisplay {
        &self.entries[step.index()]
    }

    pub fn set(&mut self, step: StepId, display: StepDisplay) {
        self.entries[step.index()] = display;
    }
}

impl Default for StepCatalog {
    fn default() -> Self {
        let entry = |title: &str, description: &str| StepDisplay {
            title: title.to_string(),
            description: description.to_string(),
        };
        Self {
            entries: [
                entry(
                    "1. Generate Viral Script",
                    "AI researches the topic and writes an engaging script with affiliate placeholders.",
                ),
                entry(
                    "2. Create Stunning Video",
                    "The script is turned into a video with AI voiceover, music, and visuals.",
                ),
                entry(
                    "3. Design Clickable Thumbnail",
                    "A high-impact thumbnail is created to maximize click-through rate.",
                ),
                entry(
                    "4. Optimize SEO & Metadata",
                    "Generates a viral title, description with timestamps, and tags.",
                ),
            ],
        }
    }
}

/// One pipeline stage inside a run.
///
/// Fields are read through accessors; mutation goes through the transition methods,
/// which are crate-private so a snapshot handed to an observer cannot be driven
/// through the state machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowStep {
    id: StepId,
    title: String,
    description: String,
    status: StepStatus,
    result: Option<StepOutput>,
    error: Option<String>,
    progress_message: Option<String>,
    started_seq: Option<u64>,
    finished_seq: Option<u64>,
}

impl WorkflowStep {
    pub(crate) fn pending(id: StepId, display: &StepDisplay) -> Self {
        Self {
            id,
            title: display.title.clone(),
            description: display.description.clone(),
            status: StepStatus::Pending,
            result: None,
            error: None,
            progress_message: None,
            started_seq: None,
            finished_seq: None,
        }
    }

    pub fn id(&self) -> StepId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn result(&self) -> Option<&StepOutput> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn progress_message(&self) -> Option<&str> {
        self.progress_message.as_deref()
    }

    /// Run-local sequence number of the transition into `Running`.
    pub fn started_seq(&self) -> Option<u64> {
        self.started_seq
    }

    /// Run-local sequence number of the transition into a terminal state.
    pub fn finished_seq(&self) -> Option<u64> {
        self.finished_seq
    }

    pub(crate) fn start(&mut self, seq: u64, progress: Option<String>) -> Result<(), ExecutionError> {
        self.transition(StepStatus::Pending, StepStatus::Running)?;
        self.started_seq = Some(seq);
        self.progress_message = progress;
        Ok(())
    }

    pub(crate) fn complete(&mut self, output: StepOutput, seq: u64) -> Result<(), ExecutionError> {
        output.ensure_belongs_to(self.id)?;
        self.transition(StepStatus::Running, StepStatus::Completed)?;
        self.result = Some(output);
        self.finished_seq = Some(seq);
        Ok(())
    }

    pub(crate) fn fail(&mut self, message: String, seq: u64) -> Result<(), ExecutionError> {
        self.transition(StepStatus::Running, StepStatus::Error)?;
        self.error = Some(message);
        self.finished_seq = Some(seq);
        Ok(())
    }

    /// Latest-wins progress update. Returns `false` when the step is not `Running`
    /// and the message was not recorded.
    pub(crate) fn record_progress(&mut self, message: String) -> bool {
        if self.status != StepStatus::Running {
            return false;
        }
        self.progress_message = Some(message);
        true
    }

    /// Replace the result without touching status, error or progress.
    pub(crate) fn overwrite_result(&mut self, output: StepOutput) -> Result<(), ExecutionError> {
        output.ensure_belongs_to(self.id)?;
        self.result = Some(output);
        Ok(())
    }

    fn transition(&mut self, from: StepStatus, to: StepStatus) -> Result<(), ExecutionError> {
        if self.status != from {
            return Err(ExecutionError::InvalidTransition {
                step: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
