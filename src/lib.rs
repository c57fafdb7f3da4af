// src/lib.rs

pub mod cli;
pub mod clock;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod task;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

pub use crate::clock::{Clock, TokioClock};
pub use crate::dag::{ResultRegistry, TaskResult};
pub use crate::engine::{BatchEvent, BatchResult, Scheduler};
pub use crate::errors::{InitdagError, TaskError, Unsatisfiable};
pub use crate::task::{TaskBody, TaskContext, TaskDescriptor};
pub use crate::types::{TaskId, TaskState};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the batch file, then either prints it (`--dry-run`)
/// or runs it once and prints a per-task report. Returns whether no task
/// failed.
pub async fn run(args: CliArgs) -> Result<bool> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(true);
    }

    let scheduler = Scheduler::new();

    // Live progress on stdout as tasks finish.
    let mut events = scheduler.subscribe();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                BatchEvent::TaskFinished(result) => print_task_line(&result),
                BatchEvent::BatchFinished(_) => break,
            }
        }
    });

    info!(path = %config_path.display(), tasks = cfg.task.len(), "running batch");
    let batch = scheduler.run_batch(cfg.to_descriptors()).await?;

    if let Err(e) = printer.await {
        debug!(error = %e, "progress printer terminated abnormally");
    }

    print_summary(&batch);
    Ok(batch.is_success())
}

fn print_task_line(result: &TaskResult) {
    match &result.error {
        Some(err) => println!(
            "  {:<9} {} ({} ms): {err}",
            result.state.to_string(),
            result.id,
            result.duration.as_millis()
        ),
        None => println!(
            "  {:<9} {} ({} ms)",
            result.state.to_string(),
            result.id,
            result.duration.as_millis()
        ),
    }
}

fn print_summary(batch: &BatchResult) {
    println!();
    println!(
        "batch finished in {} ms: {} completed, {} failed, {} skipped",
        batch.elapsed.as_millis(),
        batch.completed().len(),
        batch.failed().len(),
        batch.skipped().len()
    );
    if !batch.failed().is_empty() {
        println!("failed: {}", batch.failed().join(", "));
    }
}

/// Simple dry-run output: print tasks, deps, timings and commands.
fn print_dry_run(cfg: &ConfigFile) {
    println!("initdag dry-run");
    println!(
        "  config.strict_dependencies = {}",
        cfg.config.strict_dependencies
    );
    if let Some(ref t) = cfg.config.default_timeout {
        println!("  config.default_timeout = {t}");
    }
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        let timing = cfg.timing_of(name);
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if task.priority != 0 {
            println!("      priority: {}", task.priority);
        }
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if !task.soft_after.is_empty() {
            println!("      soft_after: {:?}", task.soft_after);
        }
        if !timing.delay_before.is_zero() {
            println!("      delay_before: {:?}", timing.delay_before);
        }
        if !timing.delay_after.is_zero() {
            println!("      delay_after: {:?}", timing.delay_after);
        }
        if !timing.timeout.is_zero() {
            println!("      timeout: {:?}", timing.timeout);
        }
        if !task.enabled {
            println!("      enabled: false");
        }
    }

    if !cfg.diagnostics().is_empty() {
        println!();
        println!("dependency problems ({}):", cfg.diagnostics().len());
        for diag in cfg.diagnostics() {
            println!("  - {diag}");
        }
    }

    debug!("dry-run complete (no execution)");
}
