#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use initdag::config::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn strict_dependencies(mut self, val: bool) -> Self {
        self.config.config.strict_dependencies = val;
        self
    }

    pub fn default_timeout(mut self, duration: &str) -> Self {
        self.config.config.default_timeout = Some(duration.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                priority: 0,
                after: vec![],
                soft_after: vec![],
                delay_before: None,
                delay_after: None,
                timeout: None,
                enabled: true,
            },
        }
    }

    pub fn priority(mut self, val: i32) -> Self {
        self.task.priority = val;
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn soft_after(mut self, dep: &str) -> Self {
        self.task.soft_after.push(dep.to_string());
        self
    }

    pub fn delay_before(mut self, duration: &str) -> Self {
        self.task.delay_before = Some(duration.to_string());
        self
    }

    pub fn delay_after(mut self, duration: &str) -> Self {
        self.task.delay_after = Some(duration.to_string());
        self
    }

    pub fn timeout(mut self, duration: &str) -> Self {
        self.task.timeout = Some(duration.to_string());
        self
    }

    pub fn enabled(mut self, val: bool) -> Self {
        self.task.enabled = val;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Writes a batch file into a temp dir for loader tests.
///
/// Holds the `TempDir`, so the file lives as long as the builder's output.
pub struct TomlFixture {
    pub dir: tempfile::TempDir,
    pub path: PathBuf,
}

/// Render a `[task.<id>]` table by hand, for tests that exercise the TOML
/// loader rather than the in-memory model.
pub fn task_table(id: &str, cmd: &str, extra: &[(&str, &str)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[task.{id}]");
    let _ = writeln!(out, "cmd = {cmd:?}");
    for (key, value) in extra {
        let _ = writeln!(out, "{key} = {value}");
    }
    out.push('\n');
    out
}

impl TomlFixture {
    pub fn write(contents: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("Initdag.toml");
        std::fs::write(&path, contents).expect("write batch file");
        Self { dir, path }
    }
}
