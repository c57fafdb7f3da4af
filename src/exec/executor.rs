// src/exec/executor.rs

//! Runs one task descriptor to a terminal state.
//!
//! Sequence: mark `Running`, `delay_before`, body (raced against the
//! timeout), `delay_after`, terminal registry write, callback, notification.
//! Each body runs on its own tokio task so a panic is captured as a task
//! failure instead of tearing down the executor.
//!
//! On timeout the body task is aborted. That interrupts an async body at its
//! next `.await`; a body that blocks a thread, or hands its work to a
//! detached task, keeps running after being scored `Failed`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::task::JoinError;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::dag::{ResultRegistry, TaskResult};
use crate::engine::notify::Notifier;
use crate::errors::{TaskError, Unsatisfiable};
use crate::task::{TaskContext, TaskDescriptor};
use crate::types::TaskState;

/// Shared handles an executor needs; cheap to clone into each spawned task.
#[derive(Clone, Debug)]
pub struct TaskExecutor {
    registry: ResultRegistry,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
}

impl TaskExecutor {
    pub fn new(registry: ResultRegistry, clock: Arc<dyn Clock>, notifier: Notifier) -> Self {
        Self {
            registry,
            clock,
            notifier,
        }
    }

    /// Execute `task` and return its terminal result.
    pub async fn execute(&self, task: Arc<TaskDescriptor>) -> TaskResult {
        let id = task.id();
        self.registry.mark_running(id);
        debug!(
            task = %id,
            priority = task.priority(),
            timeout = ?task.timeout(),
            "task started"
        );

        let started = self.clock.now();
        let outcome = self.run_phases(&task).await;
        let duration = self.clock.now().saturating_duration_since(started);

        let result = match outcome {
            Ok(()) => {
                let result = self
                    .registry
                    .finish(id, TaskState::Completed, duration, None);
                info!(task = %id, duration_ms = duration.as_millis() as u64, "task completed");
                if let Some(cb) = task.success_callback() {
                    invoke_callback(id, "on_success", || cb());
                }
                result
            }
            Err(err) => {
                warn!(
                    task = %id,
                    duration_ms = duration.as_millis() as u64,
                    error = %err,
                    "task failed"
                );
                if let Some(cb) = task.failure_callback() {
                    invoke_callback(id, "on_failure", || cb(&err));
                }
                self.registry
                    .finish(id, TaskState::Failed, duration, Some(err))
            }
        };

        self.notifier.task_finished(&result);
        result
    }

    /// Fail a task that was never launched because its dependencies cannot
    /// be satisfied. Its body is not invoked; `on_failure` is.
    pub fn fail_unlaunched(&self, task: &TaskDescriptor, reason: Unsatisfiable) -> TaskResult {
        let err = TaskError::UnsatisfiableDependency(reason);
        warn!(task = %task.id(), error = %err, "task cannot run");
        if let Some(cb) = task.failure_callback() {
            invoke_callback(task.id(), "on_failure", || cb(&err));
        }
        let result = self.registry.finish(
            task.id(),
            TaskState::Failed,
            std::time::Duration::ZERO,
            Some(err),
        );
        self.notifier.task_finished(&result);
        result
    }

    async fn run_phases(&self, task: &TaskDescriptor) -> Result<(), TaskError> {
        if !task.delay_before().is_zero() {
            debug!(task = %task.id(), delay = ?task.delay_before(), "delay before body");
            sleep(task.delay_before()).await;
        }

        self.run_body(task).await?;

        if !task.delay_after().is_zero() {
            debug!(task = %task.id(), delay = ?task.delay_after(), "delay after body");
            sleep(task.delay_after()).await;
        }

        Ok(())
    }

    async fn run_body(&self, task: &TaskDescriptor) -> Result<(), TaskError> {
        let ctx = TaskContext::new(task.id().to_string(), self.registry.clone());
        let mut handle = tokio::spawn(task.body().run(ctx));

        let joined = match task.timeout() {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_elapsed) => {
                    handle.abort();
                    return Err(TaskError::Timeout(limit));
                }
            },
            None => handle.await,
        };

        match joined {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(TaskError::ReturnedFalse),
            Ok(Err(e)) => Err(TaskError::from(e)),
            Err(join_err) => Err(TaskError::Panicked(join_error_message(join_err))),
        }
    }
}

/// Run a user callback, containing any panic it raises.
fn invoke_callback(task: &str, which: &str, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        error!(
            task = %task,
            callback = which,
            panic = %panic_message(payload.as_ref()),
            "task callback panicked; ignoring"
        );
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic().as_ref())
    } else {
        err.to_string()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
