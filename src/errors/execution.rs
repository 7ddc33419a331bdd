// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by the workflow engine itself, as opposed to a gateway call.

use thiserror::Error;

use crate::model::{RunId, StepId, StepStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// A step id string did not name one of the pipeline steps.
    #[error("Unknown step id: '{0}'")]
    UnknownStep(String),

    /// A payload was offered to a step it does not belong to.
    #[error("Step '{step}' cannot hold a '{found}' result")]
    OutputMismatch { step: StepId, found: StepId },

    /// A step was started before one of its dependencies completed.
    #[error("Step '{step}' cannot start before '{dependency}' has completed")]
    DependencyNotCompleted { step: StepId, dependency: StepId },

    /// A state machine transition was attempted from the wrong state.
    #[error("Step '{step}' cannot move from {from} to {to}")]
    InvalidTransition {
        step: StepId,
        from: StepStatus,
        to: StepStatus,
    },

    /// Bundle assembly found a step without its result.
    #[error("Asset bundle is missing the '{0}' result")]
    MissingResult(StepId),

    #[error("Asset bundle for {0} has already been published")]
    BundleAlreadyPublished(RunId),

    /// The run was replaced by a newer one before it finished.
    #[error("{0} was superseded by a newer run")]
    Superseded(RunId),

    /// Failure outside any gateway call: a panic in a driver task or an
    /// aggregation error.
    #[error("Orchestration fault: {message}")]
    OrchestrationFault { message: String },
}
