// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Generation gateway backends and support code.
//!
//! The engine only talks to a [`GenerationGateway`](crate::traits::GenerationGateway);
//! this module holds the pieces gateway implementations share, plus an in-memory
//! gateway for demos and tests.
//!
//! # Available Backends
//!
//! ## Scripted Backend
//! [`ScriptedGateway`] answers every operation from canned data:
//! - **Outputs**: fixed script, thumbnail, SEO JSON and video reference
//! - **Failures**: any step can be made to reject with a message
//! - **Timing**: per-step delays, scripted video polling
//! - **Inspection**: every call is recorded with its input
//!
//! ## Long-Running Jobs
//! [`poll_to_completion`] drives a [`LongRunningJob`] to completion and turns the
//! wait into progress messages. Provider-backed gateways implement
//! `LongRunningJob` for their video job handle and call it from
//! `generate_video`.
//!
//! ## Stub Backend (Test-Only)
//! Gateways that panic or block on demand, for exercising fault attribution and
//! superseded runs. Only compiled for tests.

pub mod long_running;
pub mod scripted;
#[cfg(test)]
pub mod stub;

pub use long_running::{poll_to_completion, JobState, LongRunningJob, PollingOptions};
pub use scripted::{GatewayCall, ScriptedGateway};
