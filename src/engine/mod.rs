// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod driver;
mod events;
mod orchestrator;
mod store;
#[cfg(test)]
mod integration_tests;

pub use orchestrator::{RunHandle, WorkflowEngine};
