// src/dag/scheduler_step.rs

//! Result type of a single readiness pass over the pending set.

use std::sync::Arc;

use crate::errors::Unsatisfiable;
use crate::task::TaskDescriptor;

/// Structured result of one [`ReadyQueue::step`](crate::dag::ReadyQueue::step).
///
/// Both lists were computed from the same registry snapshot and have already
/// been removed from the pending set.
#[derive(Debug, Default)]
pub struct SchedulerStep {
    /// Tasks whose dependencies are all satisfied, highest priority first.
    pub launch: Vec<Arc<TaskDescriptor>>,
    /// Tasks that can never become ready in this batch.
    pub blocked: Vec<(Arc<TaskDescriptor>, Unsatisfiable)>,
}

impl SchedulerStep {
    /// Nothing to launch and nothing to fail.
    pub fn is_idle(&self) -> bool {
        self.launch.is_empty() && self.blocked.is_empty()
    }
}
