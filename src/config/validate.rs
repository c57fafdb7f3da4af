// src/config/validate.rs

use std::collections::BTreeMap;

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, DependencyDiagnostic, RawConfigFile, TaskTiming};
use crate::errors::{InitdagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = InitdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let timings = validate_raw_config(&raw)?;
        let diagnostics = check_dependencies(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.config,
            raw.task,
            timings,
            diagnostics,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<BTreeMap<String, TaskTiming>> {
    ensure_has_tasks(cfg)?;
    validate_task_ids(cfg)?;
    validate_dependency_lists(cfg)?;
    resolve_timings(cfg)
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(InitdagError::ConfigError(
            "config must contain at least one [task.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_ids(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.task.keys() {
        if name.trim().is_empty() {
            return Err(InitdagError::ConfigError(
                "task ids must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_dependency_lists(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if let Some(dep) = task.after.iter().find(|d| task.soft_after.contains(d)) {
            return Err(InitdagError::ConfigError(format!(
                "task '{}' lists '{}' in both `after` and `soft_after`",
                name, dep
            )));
        }
    }
    Ok(())
}

fn resolve_timings(cfg: &RawConfigFile) -> Result<BTreeMap<String, TaskTiming>> {
    let field = |task: &str, key: &str, value: &Option<String>| match value {
        Some(s) => parse_duration(s).map_err(|e| {
            InitdagError::ConfigError(format!("task '{task}': invalid `{key}`: {e}"))
        }),
        None => Ok(Default::default()),
    };

    let default_timeout = match &cfg.config.default_timeout {
        Some(s) => parse_duration(s).map_err(|e| {
            InitdagError::ConfigError(format!("[config].default_timeout: {e}"))
        })?,
        None => Default::default(),
    };

    let mut timings = BTreeMap::new();
    for (name, task) in cfg.task.iter() {
        let timeout = match &task.timeout {
            Some(_) => field(name, "timeout", &task.timeout)?,
            None => default_timeout,
        };
        timings.insert(
            name.clone(),
            TaskTiming {
                delay_before: field(name, "delay_before", &task.delay_before)?,
                delay_after: field(name, "delay_after", &task.delay_after)?,
                timeout,
            },
        );
    }
    Ok(timings)
}

/// Collect unknown references and cycles over hard and soft edges.
///
/// With `strict_dependencies` the first problem is returned as an error;
/// otherwise every problem is logged and returned for display. The engine
/// resolves such tasks to `Failed` at run time either way.
fn check_dependencies(cfg: &RawConfigFile) -> Result<Vec<DependencyDiagnostic>> {
    let diagnostics = dependency_diagnostics(cfg);

    if cfg.config.strict_dependencies {
        if let Some(first) = diagnostics.first() {
            return Err(match first {
                DependencyDiagnostic::UnknownDependency { .. } => {
                    InitdagError::ConfigError(first.to_string())
                }
                DependencyDiagnostic::Cycle { .. } => InitdagError::DagCycle(first.to_string()),
            });
        }
    }

    for diag in &diagnostics {
        warn!(%diag, "dependency problem; affected tasks will fail at run time");
    }
    Ok(diagnostics)
}

/// Unknown references first (in task order), then one entry per cycle.
pub fn dependency_diagnostics(cfg: &RawConfigFile) -> Vec<DependencyDiagnostic> {
    let mut diagnostics = Vec::new();

    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter().chain(task.soft_after.iter()) {
            if cfg.task.contains_key(dep) {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            } else {
                diagnostics.push(DependencyDiagnostic::UnknownDependency {
                    task: name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut tasks: Vec<String> = scc.into_iter().map(str::to_string).collect();
            tasks.sort();
            tasks
        })
        .collect();
    cycles.sort();

    diagnostics.extend(
        cycles
            .into_iter()
            .map(|tasks| DependencyDiagnostic::Cycle { tasks }),
    );
    diagnostics
}
