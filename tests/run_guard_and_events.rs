// tests/run_guard_and_events.rs

mod common;
use crate::common::{drain, init_tracing, ms, Outcome, Probe};

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use initdag::errors::InitdagError;
use initdag::{BatchEvent, Clock, Scheduler, TaskState};

#[tokio::test(start_paused = true)]
async fn second_batch_while_running_is_rejected_without_side_effects() {
    init_tracing();
    let probe = Probe::new();
    let scheduler = Arc::new(Scheduler::new());

    let first = {
        let scheduler = Arc::clone(&scheduler);
        let tasks = vec![probe.ok("slow", ms(100)), probe.ok("next", ms(1)).after("slow")];
        tokio::spawn(async move { scheduler.run_batch(tasks).await })
    };

    while !scheduler.is_running() {
        tokio::task::yield_now().await;
    }

    let before = scheduler.registry().snapshot();
    let second = scheduler.run_batch(vec![probe.ok("intruder", ms(1))]).await;
    assert!(matches!(second, Err(InitdagError::AlreadyRunning)));
    assert_eq!(scheduler.registry().snapshot(), before);
    assert!(scheduler.lookup("intruder").is_none());
    assert!(!probe.started("intruder"));

    let batch = first.await.unwrap().unwrap();
    assert!(batch.is_success());
    assert!(!scheduler.is_running());

    // Guard released: the same instance accepts a new batch.
    let again = scheduler
        .run_batch(vec![probe.ok("intruder", ms(1))])
        .await
        .unwrap();
    assert_eq!(again.state_of("intruder"), Some(TaskState::Completed));
    assert!(scheduler.lookup("slow").is_none(), "registry resets per batch");
}

#[tokio::test(start_paused = true)]
async fn independent_instances_run_side_by_side() {
    let probe = Probe::new();
    let left = Scheduler::new();
    let right = Scheduler::new();

    let (a, b) = tokio::join!(
        left.run_batch(vec![probe.ok("left", ms(50))]),
        right.run_batch(vec![probe.ok("right", ms(50))]),
    );

    assert!(a.unwrap().is_success());
    assert!(b.unwrap().is_success());
    assert!(probe.overlapped("left", "right"));
}

#[tokio::test]
async fn duplicate_ids_are_rejected_before_anything_runs() {
    let probe = Probe::new();
    let scheduler = Scheduler::new();

    let err = scheduler
        .run_batch(vec![probe.ok("dup", ms(1)), probe.ok("dup", ms(1))])
        .await
        .unwrap_err();

    assert!(matches!(err, InitdagError::DuplicateTaskId(ref id) if id == "dup"));
    assert!(!probe.started("dup"));
    assert!(scheduler.registry().is_empty());
    assert!(!scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn subscribers_get_one_event_per_task_then_the_batch() {
    let probe = Probe::new();
    let scheduler = Scheduler::new();
    let mut events = scheduler.subscribe();
    let mut second = scheduler.subscribe();

    let batch = scheduler
        .run_batch(vec![
            probe.ok("a", ms(10)),
            probe.task("b", ms(5), Outcome::ReturnFalse),
            probe.ok("c", ms(1)).after("b"),
            probe.ok("d", ms(1)).enabled(false),
        ])
        .await
        .unwrap();

    let got = drain(&mut events);
    assert_eq!(got.len(), 5);

    let mut finished: Vec<(String, TaskState)> = got[..4]
        .iter()
        .map(|ev| match ev {
            BatchEvent::TaskFinished(r) => (r.id.clone(), r.state),
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    finished.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        finished,
        vec![
            ("a".to_string(), TaskState::Completed),
            ("b".to_string(), TaskState::Failed),
            ("c".to_string(), TaskState::Failed),
            ("d".to_string(), TaskState::Skipped),
        ]
    );

    match &got[4] {
        BatchEvent::BatchFinished(report) => {
            assert_eq!(report.failed(), batch.failed());
            assert_eq!(report.len(), 4);
        }
        other => panic!("expected BatchFinished last, got {other:?}"),
    }

    assert_eq!(drain(&mut second).len(), 5);
}

#[tokio::test(start_paused = true)]
async fn dropped_subscriber_does_not_block_the_batch() {
    let probe = Probe::new();
    let scheduler = Scheduler::new();
    drop(scheduler.subscribe());

    let batch = scheduler.run_batch(vec![probe.ok("a", ms(1))]).await.unwrap();
    assert!(batch.is_success());
}

#[tokio::test(start_paused = true)]
async fn lookup_reflects_live_state_during_the_batch() {
    let probe = Probe::new();
    let scheduler = Arc::new(Scheduler::new());
    let mut events = scheduler.subscribe();

    let run = {
        let scheduler = Arc::clone(&scheduler);
        let tasks = vec![probe.ok("fast", ms(10)), probe.ok("slow", ms(500))];
        tokio::spawn(async move { scheduler.run_batch(tasks).await })
    };

    // Wait until "fast" is reported; "slow" is still in its body.
    loop {
        match events.recv().await {
            Some(BatchEvent::TaskFinished(r)) if r.id == "fast" => break,
            Some(_) => continue,
            None => panic!("event stream closed early"),
        }
    }
    assert_eq!(
        scheduler.lookup("fast").map(|r| r.state),
        Some(TaskState::Completed)
    );
    assert_eq!(
        scheduler.lookup("slow").map(|r| r.state),
        Some(TaskState::Running)
    );
    assert!(scheduler.lookup("missing").is_none());

    run.await.unwrap().unwrap();
    assert_eq!(
        scheduler.lookup("slow").map(|r| r.state),
        Some(TaskState::Completed)
    );
}

#[tokio::test(start_paused = true)]
async fn lookup_does_not_find_tasks_not_yet_launched() {
    let probe = Probe::new();
    let scheduler = Arc::new(Scheduler::new());

    let run = {
        let scheduler = Arc::clone(&scheduler);
        let tasks = vec![
            probe.ok("a", ms(100)),
            probe.ok("b", ms(1)).after("a"),
            probe.observer("peek", &["b"]),
        ];
        tokio::spawn(async move { scheduler.run_batch(tasks).await })
    };

    tokio::time::sleep(ms(10)).await;
    assert_eq!(
        scheduler.lookup("a").map(|r| r.state),
        Some(TaskState::Running)
    );
    assert!(scheduler.lookup("b").is_none());
    // Still tracked for readiness.
    assert_eq!(
        scheduler.registry().snapshot().get("b"),
        Some(&TaskState::Pending)
    );

    run.await.unwrap().unwrap();
    assert_eq!(
        scheduler.lookup("b").map(|r| r.state),
        Some(TaskState::Completed)
    );

    // A body asking about a peer that had not launched yet sees nothing.
    let seen: Vec<_> = probe
        .events()
        .into_iter()
        .filter_map(|e| match e {
            common::ProbeEvent::Observed { peer, state, .. } => Some((peer, state)),
            _ => None,
        })
        .collect();
    assert_eq!(seen, vec![("b".to_string(), None)]);
}

/// Advances one second per reading.
#[derive(Debug)]
struct SteppingClock {
    base: Instant,
    ticks: AtomicU32,
}

impl Clock for SteppingClock {
    fn now(&self) -> Instant {
        let n = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.base + Duration::from_secs(u64::from(n))
    }
}

#[tokio::test]
async fn durations_come_from_the_injected_clock() {
    let probe = Probe::new();
    let clock = Arc::new(SteppingClock {
        base: Instant::now(),
        ticks: AtomicU32::new(0),
    });
    let scheduler = Scheduler::new().with_clock(clock);

    let batch = scheduler.run_batch(vec![probe.ok("only", ms(0))]).await.unwrap();

    // Readings: batch start, task start, task end, batch end.
    assert_eq!(batch.get("only").unwrap().duration, Duration::from_secs(1));
    assert_eq!(batch.elapsed, Duration::from_secs(3));
}
