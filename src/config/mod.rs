// src/config/mod.rs

//! Batch file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a batch file from disk (`loader.rs`).
//! - Validate durations and dependency references (`validate.rs`).
//! - Parse duration strings (`duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ConfigSection, DependencyDiagnostic, RawConfigFile, TaskConfig, TaskTiming,
};
pub use validate::dependency_diagnostics;
