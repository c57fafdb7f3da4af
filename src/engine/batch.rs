// src/engine/batch.rs

//! Final report of a batch.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::dag::TaskResult;
use crate::types::{TaskId, TaskState};

/// Outcome of one complete `run_batch`.
///
/// Assembled once from the final registry contents; read-only afterwards.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub elapsed: Duration,
    results: BTreeMap<TaskId, TaskResult>,
    completed: Vec<TaskId>,
    failed: Vec<TaskId>,
    skipped: Vec<TaskId>,
}

impl BatchResult {
    /// Build the report and its per-state id lists in a single pass.
    pub fn assemble(elapsed: Duration, results: impl IntoIterator<Item = TaskResult>) -> Self {
        let results: BTreeMap<TaskId, TaskResult> = results
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        let mut completed = Vec::new();
        let mut failed = Vec::new();
        let mut skipped = Vec::new();

        for (id, result) in &results {
            match result.state {
                TaskState::Completed => completed.push(id.clone()),
                TaskState::Failed => failed.push(id.clone()),
                TaskState::Skipped => skipped.push(id.clone()),
                TaskState::Pending | TaskState::Running => {}
            }
        }

        Self {
            elapsed,
            results,
            completed,
            failed,
            skipped,
        }
    }

    pub fn get(&self, id: &str) -> Option<&TaskResult> {
        self.results.get(id)
    }

    pub fn state_of(&self, id: &str) -> Option<TaskState> {
        self.results.get(id).map(|r| r.state)
    }

    /// All results, ordered by task id.
    pub fn results(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.values()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn completed(&self) -> &[TaskId] {
        &self.completed
    }

    pub fn failed(&self) -> &[TaskId] {
        &self.failed
    }

    pub fn skipped(&self) -> &[TaskId] {
        &self.skipped
    }

    /// No task failed. Skipped tasks do not count as failures.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
