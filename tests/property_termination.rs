// tests/property_termination.rs

mod common;
use crate::common::{ms, Outcome, Probe};

use proptest::prelude::*;

use initdag::{BatchResult, Scheduler, TaskDescriptor, TaskState};

#[derive(Debug, Clone)]
struct TaskSpec {
    hard: Vec<usize>,
    soft: Vec<usize>,
    work_ms: u64,
    fails: bool,
    enabled: bool,
    priority: i32,
}

// Dependencies are drawn from 0..=num_tasks: index `num_tasks` names a task
// that is not in the batch, and self or backward references produce cycles.
fn batch_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<TaskSpec>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let spec = (
            proptest::collection::vec(0..=num_tasks, 0..3),
            proptest::collection::vec(0..=num_tasks, 0..3),
            0u64..50,
            proptest::bool::weighted(0.2),
            proptest::bool::weighted(0.9),
            -5i32..5,
        )
            .prop_map(|(hard, soft, work_ms, fails, enabled, priority)| TaskSpec {
                hard,
                soft,
                work_ms,
                fails,
                enabled,
                priority,
            });
        proptest::collection::vec(spec, num_tasks)
    })
}

fn name(i: usize) -> String {
    format!("task_{i}")
}

fn descriptors(probe: &Probe, specs: &[TaskSpec]) -> Vec<TaskDescriptor> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let outcome = if spec.fails {
                Outcome::ReturnFalse
            } else {
                Outcome::Succeed
            };
            let mut t = probe
                .task(&name(i), ms(spec.work_ms), outcome)
                .with_priority(spec.priority)
                .enabled(spec.enabled);
            for &d in &spec.hard {
                t = t.after(name(d));
            }
            for &d in &spec.soft {
                t = t.after_any(name(d));
            }
            t
        })
        .collect()
}

fn run(probe: &Probe, specs: &[TaskSpec]) -> BatchResult {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("build runtime");
    rt.block_on(async {
        tokio::time::timeout(
            std::time::Duration::from_secs(3600),
            Scheduler::new().run_batch(descriptors(probe, specs)),
        )
        .await
        .expect("batch must terminate")
        .expect("batch must start")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_batch_terminates_with_consistent_results(specs in batch_strategy(8)) {
        let probe = Probe::new();
        let batch = run(&probe, &specs);

        prop_assert_eq!(batch.len(), specs.len());

        for (i, spec) in specs.iter().enumerate() {
            let id = name(i);
            let result = batch.get(&id).expect("every task has a result");
            prop_assert!(result.state.is_terminal());
            prop_assert_eq!(result.error.is_some(), result.state == TaskState::Failed);

            if !spec.enabled {
                prop_assert_eq!(result.state, TaskState::Skipped);
                prop_assert!(!probe.started(&id));
                prop_assert_eq!(probe.success_calls(&id) + probe.failure_calls(&id), 0);
                continue;
            }

            prop_assert_eq!(probe.success_calls(&id) + probe.failure_calls(&id), 1);

            if let Some(started) = probe.started_at(&id) {
                for &d in &spec.hard {
                    let dep = name(d);
                    prop_assert_eq!(batch.state_of(&dep), Some(TaskState::Completed));
                    let dep_finished = probe.finished_at(&dep);
                    prop_assert!(dep_finished.is_some_and(|f| started >= f));
                }
                for &d in &spec.soft {
                    let dep = name(d);
                    prop_assert!(batch.get(&dep).is_some());
                    if probe.started(&dep) {
                        let dep_finished = probe.finished_at(&dep);
                        prop_assert!(dep_finished.is_some_and(|f| started >= f));
                    }
                }
            }

            let hard_dep_broken = spec.hard.iter().any(|&d| {
                matches!(
                    batch.state_of(&name(d)),
                    None | Some(TaskState::Failed) | Some(TaskState::Skipped)
                )
            });
            if hard_dep_broken {
                prop_assert_eq!(result.state, TaskState::Failed);
                prop_assert!(!probe.started(&id));
            }
        }
    }
}
