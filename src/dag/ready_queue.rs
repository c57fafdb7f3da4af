// src/dag/ready_queue.rs

//! The set of not-yet-launched tasks of a batch.
//!
//! [`ReadyQueue`] is synchronous and owns no channels or runtime handles; the
//! async loop in [`engine::runtime`](crate::engine::runtime) feeds it registry
//! snapshots and acts on the [`SchedulerStep`]s it returns.

use std::cmp::Reverse;
use std::sync::Arc;

use tracing::debug;

use crate::dag::readiness::{self, Readiness};
use crate::dag::registry::StateSnapshot;
use crate::dag::scheduler_step::SchedulerStep;
use crate::errors::Unsatisfiable;
use crate::task::TaskDescriptor;
use crate::types::TaskId;

#[derive(Debug, Default)]
pub struct ReadyQueue {
    pending: Vec<Arc<TaskDescriptor>>,
}

impl ReadyQueue {
    pub fn new(pending: Vec<Arc<TaskDescriptor>>) -> Self {
        Self { pending }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_ids(&self) -> Vec<TaskId> {
        self.pending.iter().map(|t| t.id().to_string()).collect()
    }

    /// Evaluate every pending task against `snapshot`.
    ///
    /// Ready and blocked tasks leave the pending set; waiting tasks stay.
    /// Ready tasks come back sorted by descending priority. Equal priorities
    /// keep pending-set order, which callers must not rely on.
    pub fn step(&mut self, snapshot: &StateSnapshot) -> SchedulerStep {
        let mut step = SchedulerStep::default();
        let mut still_waiting = Vec::with_capacity(self.pending.len());

        for task in self.pending.drain(..) {
            match readiness::evaluate(snapshot, &task) {
                Readiness::Ready => step.launch.push(task),
                Readiness::Waiting => still_waiting.push(task),
                Readiness::Blocked(reason) => {
                    debug!(task = %task.id(), %reason, "dependency can never be satisfied");
                    step.blocked.push((task, reason));
                }
            }
        }

        self.pending = still_waiting;
        step.launch.sort_by_key(|t| Reverse(t.priority()));
        step
    }

    /// Take every remaining task out of the pending set.
    ///
    /// Called when nothing is ready and nothing is in flight: the remaining
    /// tasks can only be waiting on each other.
    pub fn drain_stalled(
        &mut self,
        snapshot: &StateSnapshot,
    ) -> Vec<(Arc<TaskDescriptor>, Unsatisfiable)> {
        self.pending
            .drain(..)
            .map(|task| {
                let waiting_on = readiness::unmet_dependencies(snapshot, &task);
                (task, Unsatisfiable::Circular { waiting_on })
            })
            .collect()
    }
}
