// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod gateway;
pub mod progress;

pub use gateway::GenerationGateway;
pub use progress::ProgressReporter;
