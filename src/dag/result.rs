// src/dag/result.rs

//! Per-task result record stored in the registry.

use std::time::Duration;

use crate::errors::TaskError;
use crate::types::{TaskId, TaskState};

/// Current (or final) outcome of one task in a batch.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub id: TaskId,
    pub state: TaskState,
    /// Elapsed time from the start of `delay_before` through `delay_after`.
    /// Zero for tasks that never ran.
    pub duration: Duration,
    /// Present iff `state == Failed`.
    pub error: Option<TaskError>,
}

impl TaskResult {
    pub fn pending(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            state: TaskState::Pending,
            duration: Duration::ZERO,
            error: None,
        }
    }

    pub fn skipped(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            state: TaskState::Skipped,
            duration: Duration::ZERO,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
