// src/dag/registry.rs

//! Shared, concurrently-accessed map of task id -> [`TaskResult`].
//!
//! The registry is the single source of truth for readiness checks. Each
//! entry has exactly one writer (the executor owning that id, or the
//! scheduler for tasks that never launch). Readers are the scheduler and any
//! task body inspecting a peer through its [`TaskContext`](crate::task::TaskContext).
//!
//! Locks are only held for the duration of a map operation, never across an
//! `.await`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::{trace, warn};

use crate::dag::result::TaskResult;
use crate::errors::TaskError;
use crate::types::{TaskId, TaskState};

/// Consistent copy of every entry's state, taken under one read lock.
pub type StateSnapshot = HashMap<TaskId, TaskState>;

/// Cheaply cloneable handle to the live result map.
#[derive(Clone, Default)]
pub struct ResultRegistry {
    entries: Arc<RwLock<HashMap<TaskId, TaskResult>>>,
}

impl ResultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries and repopulate with the initial entries of a new batch.
    pub fn reset(&self, initial: impl IntoIterator<Item = TaskResult>) {
        let mut entries = self.write();
        entries.clear();
        for result in initial {
            entries.insert(result.id.clone(), result);
        }
    }

    pub fn get(&self, id: &str) -> Option<TaskResult> {
        self.read().get(id).cloned()
    }

    pub fn state_of(&self, id: &str) -> Option<TaskState> {
        self.read().get(id).map(|r| r.state)
    }

    /// Entry for `id` once its task has been processed (launched, finished
    /// or skipped). `None` for unknown ids and for tasks still `Pending`.
    pub fn lookup(&self, id: &str) -> Option<TaskResult> {
        self.read()
            .get(id)
            .filter(|r| r.state != TaskState::Pending)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.read()
            .iter()
            .map(|(id, r)| (id.clone(), r.state))
            .collect()
    }

    /// All entries, in no particular order.
    pub fn results(&self) -> Vec<TaskResult> {
        self.read().values().cloned().collect()
    }

    /// Transition `id` from `Pending` to `Running`.
    ///
    /// Returns `false` (and leaves the entry alone) if the entry is missing or
    /// not `Pending`.
    pub fn mark_running(&self, id: &str) -> bool {
        let mut entries = self.write();
        match entries.get_mut(id) {
            Some(entry) if entry.state == TaskState::Pending => {
                entry.state = TaskState::Running;
                trace!(task = %id, "registry: Pending -> Running");
                true
            }
            Some(entry) => {
                warn!(task = %id, state = %entry.state, "registry: refusing to mark non-pending task Running");
                false
            }
            None => {
                warn!(task = %id, "registry: mark_running for unknown task");
                false
            }
        }
    }

    /// Write the terminal outcome of `id` and return the stored result.
    ///
    /// Terminal entries are immutable: finishing an already-terminal entry
    /// logs a warning and returns the existing result unchanged.
    pub fn finish(
        &self,
        id: &str,
        state: TaskState,
        duration: Duration,
        error: Option<TaskError>,
    ) -> TaskResult {
        debug_assert!(state.is_terminal());
        let mut entries = self.write();
        let entry = entries
            .entry(id.to_string())
            .or_insert_with(|| TaskResult::pending(id));

        if entry.is_terminal() {
            warn!(
                task = %id,
                existing = %entry.state,
                attempted = %state,
                "registry: entry already terminal; ignoring second write"
            );
            return entry.clone();
        }

        entry.state = state;
        entry.duration = duration;
        entry.error = error;
        trace!(task = %id, state = %state, "registry: terminal write");
        entry.clone()
    }

    // Entries are plain data; a poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<TaskId, TaskResult>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TaskId, TaskResult>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ResultRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultRegistry")
            .field("entries", &self.len())
            .finish()
    }
}
