// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

/// Callback handed to a long-running gateway operation for status updates.
///
/// Cheap to clone and safe to call from any task. Reporting never blocks: the
/// engine's reporter pushes onto an unbounded channel drained by the run driver,
/// which keeps only the latest message per step.
#[derive(Clone)]
pub struct ProgressReporter {
    sink: Arc<dyn Fn(String) + Send + Sync>,
}

impl ProgressReporter {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// A reporter that discards every message.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// A reporter paired with the receiving end of its messages.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = Self::new(move |message| {
            let _ = tx.send(message);
        });
        (reporter, rx)
    }

    pub fn report(&self, message: impl Into<String>) {
        (self.sink)(message.into());
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter").finish_non_exhaustive()
    }
}
