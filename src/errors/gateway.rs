// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Failures reported by a generation gateway.
//!
//! The `Display` text of a [`GatewayError`] is what ends up in the failed step's
//! `error` field, so messages are written for the person watching the run.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The backend rejected the request.
    #[error("{0}")]
    Rejected(String),

    /// The backend answered, but not in the expected shape.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A long-running job finished without producing a reference.
    #[error("{0}")]
    MissingReference(String),

    /// The operation did not settle in time.
    #[error("{operation} timed out after {after:?}")]
    TimedOut { operation: String, after: Duration },

    /// The job finished but its output could not be fetched; carries the status text.
    #[error("Failed to download video file. Status: {0}")]
    Download(String),
}
