// src/task/body.rs

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::dag::{ResultRegistry, TaskResult};
use crate::types::{TaskId, TaskState};

/// Future returned by a task body.
///
/// `Ok(true)` is success, `Ok(false)` is a reported failure, `Err(_)` is a
/// raised failure whose error is preserved in the task result.
pub type BodyFuture = Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'static>>;

/// The unit of work a task performs.
///
/// Implemented for any `Fn(TaskContext) -> impl Future<Output = anyhow::Result<bool>>`,
/// so most callers just pass an async closure.
pub trait TaskBody: Send + Sync {
    fn run(&self, ctx: TaskContext) -> BodyFuture;
}

impl<F, Fut> TaskBody for F
where
    F: Fn(TaskContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
{
    fn run(&self, ctx: TaskContext) -> BodyFuture {
        Box::pin(self(ctx))
    }
}

/// Handle given to a running body.
///
/// Lets the body branch on a peer's outcome, e.g. "did my soft dependency
/// actually succeed?".
#[derive(Clone)]
pub struct TaskContext {
    id: TaskId,
    registry: ResultRegistry,
}

impl TaskContext {
    pub(crate) fn new(id: TaskId, registry: ResultRegistry) -> Self {
        Self { id, registry }
    }

    /// Id of the task this body belongs to.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current registry entry for `id`. `None` if it is not in the batch or
    /// has not been processed yet (still `Pending`).
    pub fn lookup(&self, id: &str) -> Option<TaskResult> {
        self.registry.lookup(id)
    }

    pub fn state_of(&self, id: &str) -> Option<TaskState> {
        self.lookup(id).map(|r| r.state)
    }

    /// `true` only if `id` is in the batch and already `Completed`.
    pub fn succeeded(&self, id: &str) -> bool {
        self.state_of(id) == Some(TaskState::Completed)
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
