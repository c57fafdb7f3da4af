// src/engine/mod.rs

//! Batch orchestration.
//!
//! - [`runtime`] holds [`Scheduler`], the async loop that drives a batch:
//!   it feeds registry snapshots into the [`ReadyQueue`](crate::dag::ReadyQueue),
//!   launches ready tasks on a `JoinSet`, and waits for completions.
//! - [`batch`] assembles the final [`BatchResult`].
//! - [`notify`] delivers per-task and whole-batch [`BatchEvent`]s to
//!   subscribers.

pub mod batch;
pub mod notify;
pub mod runtime;

pub use batch::BatchResult;
pub use notify::{BatchEvent, Notifier};
pub use runtime::Scheduler;
