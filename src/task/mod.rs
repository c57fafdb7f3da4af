// src/task/mod.rs

//! Caller-facing task model.
//!
//! - [`descriptor`] holds the immutable per-task configuration.
//! - [`body`] defines the async body contract and the [`TaskContext`] a body
//!   receives to inspect its peers.

pub mod body;
pub mod descriptor;

pub use body::{BodyFuture, TaskBody, TaskContext};
pub use descriptor::{FailureCallback, SuccessCallback, TaskDescriptor};
