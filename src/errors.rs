// src/errors.rs

//! Crate-wide error types.
//!
//! - [`InitdagError`] is returned by the batch entry points and the config
//!   layer.
//! - [`TaskError`] is the terminal error of a single task. It lives inside a
//!   [`TaskResult`](crate::dag::TaskResult) and is handed to `on_failure`; it
//!   never aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::types::{TaskId, TaskState};

#[derive(Error, Debug)]
pub enum InitdagError {
    #[error("a batch is already running on this scheduler")]
    AlreadyRunning,

    #[error("duplicate task id in batch: {0}")]
    DuplicateTaskId(TaskId),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, InitdagError>;

/// Why a task could never become ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsatisfiable {
    /// A dependency id that is not part of the batch.
    Missing(TaskId),
    /// A hard dependency ended in a terminal state other than `Completed`.
    Upstream { dependency: TaskId, state: TaskState },
    /// Nothing left to run while this task was still waiting on the listed
    /// dependencies: the remaining tasks wait on each other.
    Circular { waiting_on: Vec<TaskId> },
}

impl std::fmt::Display for Unsatisfiable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unsatisfiable::Missing(dep) => write!(f, "dependency '{dep}' is not part of the batch"),
            Unsatisfiable::Upstream { dependency, state } => {
                write!(f, "hard dependency '{dependency}' ended {state}")
            }
            Unsatisfiable::Circular { waiting_on } => {
                write!(f, "still waiting on [{}] with nothing left to run", waiting_on.join(", "))
            }
        }
    }
}

/// Terminal failure of one task.
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    #[error("task body did not finish within {0:?}")]
    Timeout(Duration),

    #[error("initialization returned false")]
    ReturnedFalse,

    #[error("task body raised an error: {0:#}")]
    Raised(Arc<anyhow::Error>),

    #[error("task body panicked: {0}")]
    Panicked(String),

    #[error("circular or missing dependency: {0}")]
    UnsatisfiableDependency(Unsatisfiable),
}

impl TaskError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout(_))
    }

    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, TaskError::UnsatisfiableDependency(_))
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        TaskError::Raised(Arc::new(err))
    }
}
