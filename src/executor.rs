//! Atomic Mutation Executor
//!
//! Every financial flow stages its writes as one [`MutationUnit`] and commits
//! it through this executor. The executor owns the shared atomicity-and-retry
//! policy: the store applies the unit all-or-nothing, and on a transient
//! conflict the caller's build closure is re-run (re-read, re-validate,
//! re-stage) up to a fixed bound before `Conflict` surfaces.

use crate::error::LedgerError;
use crate::events::{EventBus, LedgerEvent};
use crate::store::{LedgerStore, MutationUnit, StoreError};
use std::future::Future;
use std::sync::Arc;

/// Default bound on conflict retries before `LedgerError::Conflict` surfaces.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Result of one staging pass.
pub enum Staged<T> {
    /// Commit this unit; on success, publish `events` and return `output`.
    Commit {
        unit: MutationUnit,
        output: T,
        events: Vec<LedgerEvent>,
    },
    /// Nothing to write (idempotent re-issue); return `output` as-is.
    Done { output: T },
}

impl<T> Staged<T> {
    pub fn commit(unit: MutationUnit, output: T, events: Vec<LedgerEvent>) -> Self {
        Staged::Commit {
            unit,
            output,
            events,
        }
    }

    pub fn done(output: T) -> Self {
        Staged::Done { output }
    }
}

/// Shared atomic-commit-and-retry policy for all financial flows.
pub struct MutationExecutor {
    store: Arc<dyn LedgerStore>,
    bus: EventBus,
    max_retries: u32,
}

impl MutationExecutor {
    pub fn new(store: Arc<dyn LedgerStore>, bus: EventBus) -> Self {
        Self {
            store,
            bus,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Run one operation: stage, commit, publish.
    ///
    /// `stage` reads current state, validates preconditions and returns a
    /// [`Staged`] unit. It is re-invoked from scratch after each transient
    /// conflict, so it must not carry side effects of its own.
    pub async fn run<T, Fut, F>(&self, mut stage: F) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Staged<T>, LedgerError>> + Send,
    {
        let mut attempts = 0u32;
        loop {
            match stage().await? {
                Staged::Done { output } => return Ok(output),
                Staged::Commit {
                    unit,
                    output,
                    events,
                } => match self.store.apply(&unit).await {
                    Ok(()) => {
                        for event in events {
                            self.bus.publish(event);
                        }
                        return Ok(output);
                    }
                    Err(StoreError::Conflict) if attempts < self.max_retries => {
                        attempts += 1;
                        tracing::debug!(attempts, "mutation unit conflicted, restaging");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                },
            }
        }
    }
}
