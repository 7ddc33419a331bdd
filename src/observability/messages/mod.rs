// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit the event with structured fields at its intended level.
//!
//! # Organization
//!
//! * `engine` - run lifecycle, superseded runs, orchestration faults
//! * `step` - step transitions, progress and edits
//! * `gateway` - long-running job polling
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_clapperboard::observability::messages::StructuredLog;
//! use the_clapperboard::observability::messages::gateway::PollRefreshFailed;
//!
//! let msg = PollRefreshFailed {
//!     operation: "video generation",
//!     attempt: 3,
//!     error: "connection reset",
//! };
//!
//! msg.log();
//! ```

pub mod engine;
pub mod gateway;
pub mod step;

use tracing::Span;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the event.
    fn log(&self);

    /// Open a span carrying the same fields.
    fn span(&self, name: &str) -> Span;
}
