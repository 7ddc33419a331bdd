// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data model: steps, runs and the generated assets.

pub mod assets;
pub mod run;
pub mod step;

pub use assets::{AssetBundle, ImageRef, SeoMetadata, VideoRef};
pub use run::{RunFailure, RunId, RunStatus, WorkflowRun};
pub use step::{StepCatalog, StepDisplay, StepId, StepOutput, StepStatus, WorkflowStep};
