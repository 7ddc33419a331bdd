// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::GatewayError;
use crate::model::{StepId, StepOutput};

/// Event sent from a fan-out branch to the run driver.
///
/// Branches never touch the run themselves; the driver is the only writer and
/// applies these in arrival order.
#[derive(Debug, Clone)]
pub(crate) enum StepEvent {
    /// Latest status text from a long-running operation
    Progress { step: StepId, message: String },
    /// The branch finished, one way or another
    Settled { step: StepId, outcome: BranchOutcome },
}

/// How a fan-out branch ended.
#[derive(Debug, Clone)]
pub(crate) enum BranchOutcome {
    Completed(StepOutput),
    /// The gateway call failed; a normal step failure
    Failed(GatewayError),
    /// The branch task died (panicked or was cancelled) before the gateway answered
    Faulted(String),
}
