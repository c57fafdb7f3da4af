// src/dag/readiness.rs

//! Dependency satisfaction checks.
//!
//! Everything here is a pure function of a [`StateSnapshot`] taken from the
//! registry; nothing is mutated.

use crate::dag::registry::StateSnapshot;
use crate::errors::Unsatisfiable;
use crate::task::TaskDescriptor;
use crate::types::{TaskId, TaskState};

/// Outcome of evaluating one pending task against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// All hard and soft dependencies are satisfied.
    Ready,
    /// At least one dependency has not reached the required state yet, but
    /// still might.
    Waiting,
    /// Some dependency can never be satisfied in this batch.
    Blocked(Unsatisfiable),
}

/// `Completed` satisfies a hard dependency; nothing else does.
pub fn hard_satisfied(snapshot: &StateSnapshot, dep: &str) -> bool {
    matches!(snapshot.get(dep), Some(TaskState::Completed))
}

/// Any terminal state satisfies a soft dependency.
pub fn soft_satisfied(snapshot: &StateSnapshot, dep: &str) -> bool {
    snapshot.get(dep).is_some_and(|s| s.is_terminal())
}

/// `true` iff every hard and soft dependency of `task` is satisfied.
/// Missing entries count as unsatisfied.
pub fn is_ready(snapshot: &StateSnapshot, task: &TaskDescriptor) -> bool {
    task.hard_deps().iter().all(|d| hard_satisfied(snapshot, d))
        && task.soft_deps().iter().all(|d| soft_satisfied(snapshot, d))
}

/// Like [`is_ready`], but distinguishes "not yet" from "never".
///
/// The registry holds an entry for every task of the batch from the moment
/// the batch starts, so an id missing from the snapshot will never appear.
/// A hard dependency that already ended `Failed` or `Skipped` will never
/// become `Completed`.
pub fn evaluate(snapshot: &StateSnapshot, task: &TaskDescriptor) -> Readiness {
    let mut waiting = false;

    for dep in task.hard_deps() {
        match snapshot.get(dep) {
            None => return Readiness::Blocked(Unsatisfiable::Missing(dep.clone())),
            Some(TaskState::Completed) => {}
            Some(state @ (TaskState::Failed | TaskState::Skipped)) => {
                return Readiness::Blocked(Unsatisfiable::Upstream {
                    dependency: dep.clone(),
                    state: *state,
                });
            }
            Some(TaskState::Pending | TaskState::Running) => waiting = true,
        }
    }

    for dep in task.soft_deps() {
        match snapshot.get(dep) {
            None => return Readiness::Blocked(Unsatisfiable::Missing(dep.clone())),
            Some(state) if state.is_terminal() => {}
            Some(_) => waiting = true,
        }
    }

    if waiting {
        Readiness::Waiting
    } else {
        Readiness::Ready
    }
}

/// Dependencies of `task` that are not satisfied in `snapshot`, hard first.
pub fn unmet_dependencies(snapshot: &StateSnapshot, task: &TaskDescriptor) -> Vec<TaskId> {
    let hard = task
        .hard_deps()
        .iter()
        .filter(|d| !hard_satisfied(snapshot, d));
    let soft = task
        .soft_deps()
        .iter()
        .filter(|d| !soft_satisfied(snapshot, d));
    hard.chain(soft).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskContext;

    async fn noop(_ctx: TaskContext) -> anyhow::Result<bool> {
        Ok(true)
    }

    fn snapshot(entries: &[(&str, TaskState)]) -> StateSnapshot {
        entries
            .iter()
            .map(|(id, s)| (id.to_string(), *s))
            .collect()
    }

    #[test]
    fn no_dependencies_is_always_ready() {
        let task = TaskDescriptor::new("a", noop);
        let snap = StateSnapshot::new();
        assert!(is_ready(&snap, &task));
        assert_eq!(evaluate(&snap, &task), Readiness::Ready);
    }

    #[test]
    fn hard_dependency_needs_completed() {
        let task = TaskDescriptor::new("c", noop).after("a");

        for state in [TaskState::Pending, TaskState::Running] {
            let snap = snapshot(&[("a", state)]);
            assert!(!is_ready(&snap, &task));
            assert_eq!(evaluate(&snap, &task), Readiness::Waiting);
        }

        let snap = snapshot(&[("a", TaskState::Completed)]);
        assert!(is_ready(&snap, &task));

        for state in [TaskState::Failed, TaskState::Skipped] {
            let snap = snapshot(&[("a", state)]);
            assert!(!is_ready(&snap, &task));
            assert_eq!(
                evaluate(&snap, &task),
                Readiness::Blocked(Unsatisfiable::Upstream {
                    dependency: "a".to_string(),
                    state,
                })
            );
        }
    }

    #[test]
    fn soft_dependency_accepts_any_terminal_state() {
        let task = TaskDescriptor::new("b", noop).after_any("a");

        for state in [TaskState::Completed, TaskState::Failed, TaskState::Skipped] {
            let snap = snapshot(&[("a", state)]);
            assert!(is_ready(&snap, &task), "soft dep in {state} should be satisfied");
        }

        let snap = snapshot(&[("a", TaskState::Running)]);
        assert!(!is_ready(&snap, &task));
        assert_eq!(evaluate(&snap, &task), Readiness::Waiting);
    }

    #[test]
    fn missing_dependency_is_unsatisfied_and_blocked() {
        let task = TaskDescriptor::new("b", noop).after_any("ghost");
        let snap = StateSnapshot::new();
        assert!(!is_ready(&snap, &task));
        assert_eq!(
            evaluate(&snap, &task),
            Readiness::Blocked(Unsatisfiable::Missing("ghost".to_string()))
        );
    }

    #[test]
    fn blocked_wins_over_waiting() {
        let task = TaskDescriptor::new("c", noop).after("slow").after("broken");
        let snap = snapshot(&[("slow", TaskState::Running), ("broken", TaskState::Failed)]);
        assert!(matches!(evaluate(&snap, &task), Readiness::Blocked(_)));
    }

    #[test]
    fn unmet_lists_hard_then_soft() {
        let task = TaskDescriptor::new("c", noop)
            .after("a")
            .after("done")
            .after_any("b");
        let snap = snapshot(&[
            ("a", TaskState::Pending),
            ("done", TaskState::Completed),
            ("b", TaskState::Running),
        ]);
        assert_eq!(
            unmet_dependencies(&snap, &task),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
