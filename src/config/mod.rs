// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod runtime;
mod validation;

pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, EngineConfig, ExecutorOptions, PollingConfig,
    StepDisplayConfig, TimeoutConfig,
};
pub use runtime::{EngineBuilder, EngineSettings};
pub use validation::validate_config;
