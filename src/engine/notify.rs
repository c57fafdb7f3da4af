// src/engine/notify.rs

//! Completion notifications.
//!
//! Subscribers get an unbounded channel of [`BatchEvent`]s: one
//! `TaskFinished` per task (after its terminal registry write) and one
//! `BatchFinished` per batch (after the report is assembled). Subscribers
//! whose receiver was dropped are pruned on the next send.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::trace;

use crate::dag::TaskResult;
use crate::engine::batch::BatchResult;

#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// A task reached its terminal state.
    TaskFinished(TaskResult),
    /// The whole batch finished; carries the final report.
    BatchFinished(BatchResult),
}

#[derive(Clone, Default)]
pub struct Notifier {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<BatchEvent>>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<BatchEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    pub fn task_finished(&self, result: &TaskResult) {
        self.emit(BatchEvent::TaskFinished(result.clone()));
    }

    pub fn batch_finished(&self, batch: &BatchResult) {
        self.emit(BatchEvent::BatchFinished(batch.clone()));
    }

    fn emit(&self, event: BatchEvent) {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        trace!(subscribers = subscribers.len(), "notification emitted");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<BatchEvent>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.lock().len())
            .finish()
    }
}
