// tests/batch_file.rs

mod common;
use crate::common::builders::{task_table, ConfigFileBuilder, TaskConfigBuilder, TomlFixture};
use crate::common::init_tracing;

use std::time::Duration;

use initdag::cli::CliArgs;
use initdag::config::{load_and_validate, load_from_path, DependencyDiagnostic};
use initdag::errors::InitdagError;
use initdag::{Scheduler, TaskState};

const SAMPLE: &str = r#"
[config]
default_timeout = "30s"

[task.sdk_core]
cmd = "true"
priority = 100

[task.crash_reporter]
cmd = "exit 1"
priority = 90
delay_before = "10ms"

[task.analytics]
cmd = "true"
after = ["sdk_core"]
soft_after = ["crash_reporter"]
timeout = "5s"

[task.ads]
cmd = "true"
after = ["crash_reporter"]

[task.experiments]
cmd = "true"
enabled = false
"#;

#[test]
fn loads_tasks_timings_and_defaults() {
    let fixture = TomlFixture::write(SAMPLE);
    let cfg = load_and_validate(&fixture.path).expect("sample should validate");

    assert_eq!(cfg.task.len(), 5);
    assert!(cfg.diagnostics().is_empty());
    assert_eq!(cfg.task["sdk_core"].priority, 100);
    assert!(!cfg.task["experiments"].enabled);
    assert!(cfg.task["ads"].enabled);

    assert_eq!(cfg.timing_of("analytics").timeout, Duration::from_secs(5));
    assert_eq!(cfg.timing_of("sdk_core").timeout, Duration::from_secs(30));
    assert_eq!(
        cfg.timing_of("crash_reporter").delay_before,
        Duration::from_millis(10)
    );

    let descriptors = cfg.to_descriptors();
    let analytics = descriptors.iter().find(|d| d.id() == "analytics").unwrap();
    assert!(analytics.hard_deps().contains("sdk_core"));
    assert!(analytics.soft_deps().contains("crash_reporter"));
    assert_eq!(analytics.timeout(), Some(Duration::from_secs(5)));
}

#[test]
fn malformed_toml_and_missing_file_are_errors() {
    let fixture = TomlFixture::write("[task.a]\ncmd = \n");
    assert!(matches!(
        load_from_path(&fixture.path),
        Err(InitdagError::TomlError(_))
    ));

    let missing = fixture.dir.path().join("nope.toml");
    assert!(matches!(
        load_from_path(&missing),
        Err(InitdagError::IoError(_))
    ));
}

#[test]
fn empty_batch_file_is_rejected() {
    let fixture = TomlFixture::write("[config]\nstrict_dependencies = true\n");
    assert!(matches!(
        load_and_validate(&fixture.path),
        Err(InitdagError::ConfigError(_))
    ));
}

#[test]
fn lenient_mode_reports_problems_and_strict_mode_refuses() {
    let mut body = String::new();
    body.push_str(&task_table("a", "true", &[("after", r#"["b"]"#)]));
    body.push_str(&task_table("b", "true", &[("after", r#"["a"]"#)]));
    body.push_str(&task_table("c", "true", &[("soft_after", r#"["ghost"]"#)]));

    let lenient = TomlFixture::write(&body);
    let cfg = load_and_validate(&lenient.path).expect("lenient load");
    assert_eq!(
        cfg.diagnostics(),
        [
            DependencyDiagnostic::UnknownDependency {
                task: "c".to_string(),
                dependency: "ghost".to_string(),
            },
            DependencyDiagnostic::Cycle {
                tasks: vec!["a".to_string(), "b".to_string()],
            },
        ]
    );

    let strict = TomlFixture::write(&format!("[config]\nstrict_dependencies = true\n\n{body}"));
    assert!(matches!(
        load_and_validate(&strict.path),
        Err(InitdagError::ConfigError(_))
    ));
}

#[test]
fn builder_matches_file_model() {
    let cfg = ConfigFileBuilder::new()
        .default_timeout("2s")
        .with_task("core", TaskConfigBuilder::new("true").priority(5).build())
        .with_task(
            "late",
            TaskConfigBuilder::new("true")
                .after("core")
                .delay_after("250ms")
                .build(),
        )
        .build();

    assert_eq!(cfg.timing_of("late").timeout, Duration::from_secs(2));
    assert_eq!(cfg.timing_of("late").delay_after, Duration::from_millis(250));
}

#[cfg(unix)]
#[tokio::test]
async fn shell_tasks_run_end_to_end() {
    init_tracing();
    let fixture = TomlFixture::write(SAMPLE);
    let cfg = load_and_validate(&fixture.path).unwrap();

    let scheduler = Scheduler::new();
    let batch = scheduler.run_batch(cfg.to_descriptors()).await.unwrap();

    assert_eq!(batch.state_of("sdk_core"), Some(TaskState::Completed));
    assert_eq!(batch.state_of("crash_reporter"), Some(TaskState::Failed));
    assert_eq!(batch.state_of("analytics"), Some(TaskState::Completed));
    assert_eq!(batch.state_of("ads"), Some(TaskState::Failed));
    assert_eq!(batch.state_of("experiments"), Some(TaskState::Skipped));
}

#[cfg(unix)]
#[tokio::test]
async fn shell_task_timeout_kills_the_process() {
    let cfg = ConfigFileBuilder::new()
        .with_task("stuck", TaskConfigBuilder::new("sleep 30").timeout("200ms").build())
        .build();

    let batch = Scheduler::new()
        .run_batch(cfg.to_descriptors())
        .await
        .unwrap();

    let stuck = batch.get("stuck").unwrap();
    assert_eq!(stuck.state, TaskState::Failed);
    assert!(stuck.error.as_ref().unwrap().is_timeout());
    assert!(stuck.duration >= Duration::from_millis(200));
    assert!(batch.elapsed < Duration::from_secs(10));
}

#[cfg(unix)]
#[tokio::test]
async fn run_entry_point_reports_success_and_dry_run() {
    let ok = TomlFixture::write(&task_table("only", "true", &[]));
    let args = |path: &std::path::Path, dry_run: bool| CliArgs {
        config: path.display().to_string(),
        log_level: None,
        dry_run,
    };

    assert!(initdag::run(args(&ok.path, false)).await.unwrap());

    let failing = TomlFixture::write(&task_table("only", "exit 7", &[]));
    assert!(!initdag::run(args(&failing.path, false)).await.unwrap());
    // Dry run never executes, so the failing command does not matter.
    assert!(initdag::run(args(&failing.path, true)).await.unwrap());
}
