// src/config/model.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::ShellCommandBody;
use crate::task::TaskDescriptor;

/// Top-level batch file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// strict_dependencies = false
/// default_timeout = "30s"
///
/// [task.sdk_core]
/// cmd = "./init-core.sh"
/// priority = 100
///
/// [task.analytics]
/// cmd = "./init-analytics.sh"
/// after = ["sdk_core"]
/// soft_after = ["crash_reporter"]
/// timeout = "5s"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Batch-wide settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<id>]`, keyed by task id.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigSection {
    /// Reject unknown dependency references and cycles at load time instead
    /// of letting the affected tasks fail at run time.
    #[serde(default)]
    pub strict_dependencies: bool,

    /// Timeout applied to tasks that do not set their own. Unset or `"0"`
    /// means unbounded.
    #[serde(default)]
    pub default_timeout: Option<String>,
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command run as the task body. Exit status 0 is success.
    pub cmd: String,

    /// Higher launches first among tasks that become ready together.
    #[serde(default)]
    pub priority: i32,

    /// Hard dependencies: these must complete successfully first.
    #[serde(default)]
    pub after: Vec<String>,

    /// Soft dependencies: these must merely finish, in any state.
    #[serde(default)]
    pub soft_after: Vec<String>,

    #[serde(default)]
    pub delay_before: Option<String>,

    #[serde(default)]
    pub delay_after: Option<String>,

    /// Body timeout; falls back to `[config].default_timeout`.
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Parsed durations of one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskTiming {
    pub delay_before: Duration,
    pub delay_after: Duration,
    /// Zero means unbounded.
    pub timeout: Duration,
}

/// Dependency problems found while loading a batch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyDiagnostic {
    UnknownDependency { task: String, dependency: String },
    Cycle { tasks: Vec<String> },
}

impl fmt::Display for DependencyDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyDiagnostic::UnknownDependency { task, dependency } => {
                write!(f, "task '{task}' has unknown dependency '{dependency}'")
            }
            DependencyDiagnostic::Cycle { tasks } => {
                write!(f, "cycle detected involving tasks: {}", tasks.join(", "))
            }
        }
    }
}

/// A validated batch file.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)` (see
/// `validate.rs`), so every duration is known to parse.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskConfig>,
    timings: BTreeMap<String, TaskTiming>,
    diagnostics: Vec<DependencyDiagnostic>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        task: BTreeMap<String, TaskConfig>,
        timings: BTreeMap<String, TaskTiming>,
        diagnostics: Vec<DependencyDiagnostic>,
    ) -> Self {
        Self {
            config,
            task,
            timings,
            diagnostics,
        }
    }

    /// Unknown references and cycles that were tolerated because
    /// `strict_dependencies` is off.
    pub fn diagnostics(&self) -> &[DependencyDiagnostic] {
        &self.diagnostics
    }

    pub fn timing_of(&self, id: &str) -> TaskTiming {
        self.timings.get(id).copied().unwrap_or_default()
    }

    /// Build one descriptor per task, each running its `cmd` through the
    /// shell.
    pub fn to_descriptors(&self) -> Vec<TaskDescriptor> {
        self.task
            .iter()
            .map(|(id, tc)| {
                let timing = self.timing_of(id);
                let body = Arc::new(ShellCommandBody::new(tc.cmd.as_str()));
                let mut descriptor = TaskDescriptor::from_body(id.clone(), body)
                    .with_priority(tc.priority)
                    .with_delay_before(timing.delay_before)
                    .with_delay_after(timing.delay_after)
                    .with_timeout(timing.timeout)
                    .enabled(tc.enabled);
                for dep in &tc.after {
                    descriptor = descriptor.after(dep.clone());
                }
                for dep in &tc.soft_after {
                    descriptor = descriptor.after_any(dep.clone());
                }
                descriptor
            })
            .collect()
    }
}
