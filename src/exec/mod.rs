// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`executor`] runs one task descriptor through its delays, body and
//!   timeout, and records the terminal result.
//! - [`command`] provides [`ShellCommandBody`], the body used for tasks
//!   defined in a batch file, built on `tokio::process::Command`.

pub mod command;
pub mod executor;

pub use command::ShellCommandBody;
pub use executor::TaskExecutor;
