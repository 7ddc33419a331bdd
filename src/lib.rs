// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Workflow orchestration for a generative asset pipeline.
//!
//! A run turns one topic into a script, a video, a thumbnail and SEO metadata.
//! The script comes first; the other three then run concurrently and
//! independently. The asset bundle is published only when all four succeed.

pub mod backends;      // gateway support + in-memory gateway
pub mod config;        // config loading, validation, engine builder
pub mod engine;        // run driver + presentation contract
pub mod errors;        // error handling
pub mod model;         // steps, runs, assets
pub mod observability;
pub mod traits;        // gateway seam

pub use config::{EngineBuilder, EngineConfig, EngineSettings};
pub use engine::{RunHandle, WorkflowEngine};
pub use model::{AssetBundle, RunStatus, StepId, StepOutput, StepStatus, WorkflowRun, WorkflowStep};
pub use traits::{GenerationGateway, ProgressReporter};
