// src/dag/mod.rs

//! Dependency bookkeeping for a batch.
//!
//! - [`registry`] holds the live id -> result map shared by the scheduler and
//!   task bodies.
//! - [`readiness`] decides whether a pending task may launch.
//! - [`ready_queue`] is the pending set and its per-step partitioning.
//! - [`scheduler_step`] defines the result type of one readiness pass.
//! - [`result`] is the per-task result record.

pub mod readiness;
pub mod ready_queue;
pub mod registry;
pub mod result;
pub mod scheduler_step;

pub use readiness::Readiness;
pub use ready_queue::ReadyQueue;
pub use registry::{ResultRegistry, StateSnapshot};
pub use result::TaskResult;
pub use scheduler_step::SchedulerStep;
