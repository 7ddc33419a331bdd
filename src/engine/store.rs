// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Single-writer home of the current [`WorkflowRun`].
//!
//! Every mutation goes through [`RunStore::apply`] tagged with the [`RunId`] it
//! belongs to. Mutations for a run that is no longer current are discarded and
//! reported as [`ExecutionError::Superseded`] to the caller, which is how a driver
//! learns it has been replaced. Readers only ever get clones.

use tokio::sync::{mpsc, RwLock};

use crate::errors::ExecutionError;
use crate::model::{RunId, RunStatus, StepCatalog, StepOutput, WorkflowRun};
use crate::observability::messages::engine::{RunSuperseded, StaleEventDiscarded};
use crate::observability::messages::StructuredLog;

struct StoreState {
    current: WorkflowRun,
    last_id: u64,
    observers: Vec<mpsc::UnboundedSender<WorkflowRun>>,
}

impl StoreState {
    fn next_id(&mut self) -> RunId {
        self.last_id += 1;
        RunId::new(self.last_id)
    }

    fn replace(&mut self, run: WorkflowRun) {
        if self.current.status() == RunStatus::Running {
            RunSuperseded {
                run_id: self.current.id(),
                replaced_by: run.id(),
            }
            .log();
        }
        self.current = run;
        self.notify();
    }

    fn notify(&mut self) {
        let snapshot = &self.current;
        self.observers
            .retain(|observer| observer.send(snapshot.clone()).is_ok());
    }
}

pub(crate) struct RunStore {
    state: RwLock<StoreState>,
}

impl RunStore {
    /// A store holding an idle run with every step pending.
    pub(crate) fn new(catalog: &StepCatalog) -> Self {
        let idle = WorkflowRun::new(RunId::new(0), String::new(), RunStatus::Idle, catalog);
        Self {
            state: RwLock::new(StoreState {
                current: idle,
                last_id: 0,
                observers: Vec::new(),
            }),
        }
    }

    /// Replace the current run with a fresh running one for `topic`.
    pub(crate) async fn begin(&self, topic: String, catalog: &StepCatalog) -> RunId {
        let mut state = self.state.write().await;
        let id = state.next_id();
        state.replace(WorkflowRun::new(id, topic, RunStatus::Running, catalog));
        id
    }

    /// Replace the current run with an idle one. Any in-flight run is superseded.
    pub(crate) async fn reset(&self, catalog: &StepCatalog) -> RunId {
        let mut state = self.state.write().await;
        let id = state.next_id();
        state.replace(WorkflowRun::new(id, String::new(), RunStatus::Idle, catalog));
        id
    }

    pub(crate) async fn snapshot(&self) -> WorkflowRun {
        self.state.read().await.current.clone()
    }

    /// Apply `mutation` to run `run_id` if it is still current.
    ///
    /// Observers are notified only when the mutation succeeds.
    pub(crate) async fn apply<T, F>(
        &self,
        run_id: RunId,
        event: &str,
        mutation: F,
    ) -> Result<T, ExecutionError>
    where
        F: FnOnce(&mut WorkflowRun) -> Result<T, ExecutionError>,
    {
        let mut state = self.state.write().await;
        if state.current.id() != run_id {
            StaleEventDiscarded {
                run_id,
                current: state.current.id(),
                event,
            }
            .log();
            return Err(ExecutionError::Superseded(run_id));
        }
        let value = mutation(&mut state.current)?;
        state.notify();
        Ok(value)
    }

    /// Overwrite a result on whichever run is current.
    pub(crate) async fn edit(&self, output: StepOutput) -> Result<RunId, ExecutionError> {
        let mut state = self.state.write().await;
        state.current.overwrite_result(output)?;
        state.notify();
        Ok(state.current.id())
    }

    /// Receive a snapshot now and after every applied change.
    ///
    /// Each change queues a full clone of the run, thumbnail data URI included.
    /// The channel is unbounded, so a receiver that is kept but never drained
    /// grows with every change; dropping it unsubscribes on the next change.
    pub(crate) async fn subscribe(&self) -> mpsc::UnboundedReceiver<WorkflowRun> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.write().await;
        if tx.send(state.current.clone()).is_ok() {
            state.observers.push(tx);
        }
        rx
    }
}
