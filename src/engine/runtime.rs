// src/engine/runtime.rs

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::clock::{Clock, TokioClock};
use crate::dag::{ReadyQueue, ResultRegistry, TaskResult};
use crate::engine::batch::BatchResult;
use crate::engine::notify::{BatchEvent, Notifier};
use crate::errors::{InitdagError, Result, TaskError};
use crate::exec::TaskExecutor;
use crate::task::TaskDescriptor;
use crate::types::TaskState;

/// Runs batches of initialization tasks.
///
/// One instance owns one result registry and one run guard: a second
/// [`run_batch`](Scheduler::run_batch) while a batch is in progress fails
/// with [`InitdagError::AlreadyRunning`]. Independent batches that must
/// overlap use independent instances.
///
/// Share an instance across tasks by wrapping it in an `Arc`.
pub struct Scheduler {
    registry: ResultRegistry,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    running: Arc<AtomicBool>,
    batch_counter: AtomicU64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("registry", &self.registry)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            registry: ResultRegistry::new(),
            notifier: Notifier::new(),
            clock: Arc::new(TokioClock),
            running: Arc::new(AtomicBool::new(false)),
            batch_counter: AtomicU64::new(0),
        }
    }

    /// Replace the time source used to measure durations.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Subscribe to per-task and whole-batch completion events.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<BatchEvent> {
        self.notifier.subscribe()
    }

    /// Live (or, after a batch, final) registry entry for `id`. Tasks not
    /// yet launched are not found.
    pub fn lookup(&self, id: &str) -> Option<TaskResult> {
        self.registry.lookup(id)
    }

    /// Handle to the live registry.
    pub fn registry(&self) -> ResultRegistry {
        self.registry.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run `tasks` to completion and return the batch report.
    ///
    /// Fails without touching any state if a batch is already running on
    /// this instance or if two tasks share an id. Individual task failures
    /// never fail the batch; they are reported in the [`BatchResult`].
    pub async fn run_batch(&self, tasks: Vec<TaskDescriptor>) -> Result<BatchResult> {
        let _guard = RunGuard::acquire(&self.running)?;
        ensure_unique_ids(&tasks)?;

        let batch_id = self.batch_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let span = info_span!("batch", batch_id, tasks = tasks.len());
        Ok(self.run_guarded(tasks).instrument(span).await)
    }

    async fn run_guarded(&self, tasks: Vec<TaskDescriptor>) -> BatchResult {
        let started = self.clock.now();
        let (enabled, disabled): (Vec<_>, Vec<_>) =
            tasks.into_iter().partition(|t| t.is_enabled());

        info!(
            enabled = enabled.len(),
            disabled = disabled.len(),
            "batch started"
        );

        self.registry.reset(
            enabled
                .iter()
                .map(|t| TaskResult::pending(t.id()))
                .chain(disabled.iter().map(|t| TaskResult::skipped(t.id()))),
        );

        for task in &disabled {
            debug!(task = %task.id(), "task disabled; skipped");
            self.notifier.task_finished(&TaskResult::skipped(task.id()));
        }

        let executor = TaskExecutor::new(
            self.registry.clone(),
            Arc::clone(&self.clock),
            self.notifier.clone(),
        );
        let mut queue = ReadyQueue::new(enabled.into_iter().map(Arc::new).collect());
        let mut in_flight: JoinSet<TaskResult> = JoinSet::new();

        while !queue.is_empty() {
            let snapshot = self.registry.snapshot();
            let step = queue.step(&snapshot);
            let any_blocked = !step.blocked.is_empty();

            for (task, reason) in step.blocked {
                executor.fail_unlaunched(&task, reason);
            }

            for task in step.launch {
                debug!(task = %task.id(), priority = task.priority(), "launching task");
                let exec = executor.clone();
                let span = info_span!("task", task = %task.id());
                in_flight.spawn(async move { exec.execute(task).await }.instrument(span));
            }

            // Failing blocked tasks changed the registry: re-evaluate before
            // waiting, their dependents may be blocked too.
            if any_blocked {
                continue;
            }

            if in_flight.is_empty() {
                warn!(
                    remaining = ?queue.pending_ids(),
                    "no task ready and none running; failing remaining tasks"
                );
                let stalled = queue.drain_stalled(&snapshot);
                for (task, reason) in stalled {
                    executor.fail_unlaunched(&task, reason);
                }
                break;
            }

            if queue.is_empty() {
                break;
            }

            join_one(&mut in_flight).await;
        }

        while !in_flight.is_empty() {
            join_one(&mut in_flight).await;
        }

        self.finalize_unfinished();

        let elapsed = self.clock.now().saturating_duration_since(started);
        let batch = BatchResult::assemble(elapsed, self.registry.results());
        info!(
            completed = batch.completed().len(),
            failed = batch.failed().len(),
            skipped = batch.skipped().len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "batch finished"
        );
        self.notifier.batch_finished(&batch);
        batch
    }

    /// Any entry still non-terminal here lost its executor (the spawned task
    /// died before writing a result). Record it as failed so no task leaves
    /// the batch Pending or Running.
    fn finalize_unfinished(&self) {
        for result in self.registry.results() {
            if result.is_terminal() {
                continue;
            }
            error!(task = %result.id, state = %result.state, "task left without a terminal state");
            let finished = self.registry.finish(
                &result.id,
                TaskState::Failed,
                result.duration,
                Some(TaskError::Panicked(
                    "executor terminated before recording a result".to_string(),
                )),
            );
            self.notifier.task_finished(&finished);
        }
    }
}

/// Wait for one in-flight task to finish.
async fn join_one(in_flight: &mut JoinSet<TaskResult>) {
    match in_flight.join_next().await {
        Some(Ok(result)) => {
            debug!(task = %result.id, state = %result.state, "task joined");
        }
        Some(Err(err)) => {
            error!(error = %err, "task executor terminated abnormally");
        }
        None => {}
    }
}

fn ensure_unique_ids(tasks: &[TaskDescriptor]) -> Result<()> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(task.id()) {
            return Err(InitdagError::DuplicateTaskId(task.id().to_string()));
        }
    }
    Ok(())
}

/// Holds the per-instance "batch in progress" flag; released on drop, so
/// the flag is cleared on success, failure, panic and cancellation alike.
struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| InitdagError::AlreadyRunning)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
