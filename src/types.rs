// src/types.rs

use std::fmt;

/// Canonical task identity used throughout the engine.
pub type TaskId = String;

/// Lifecycle state of a task within one batch.
///
/// `Pending -> Running -> {Completed, Failed}`, or straight to `Skipped`
/// for disabled tasks. The scheduler may also move a `Pending` task directly
/// to `Failed` when its dependencies can never be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl TaskState {
    /// Completed, Failed or Skipped. No further transitions happen from here.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Skipped
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Pending => "Pending",
            TaskState::Running => "Running",
            TaskState::Completed => "Completed",
            TaskState::Failed => "Failed",
            TaskState::Skipped => "Skipped",
        };
        f.write_str(s)
    }
}
