#![allow(dead_code)]

//! Instrumented task bodies for engine tests.
//!
//! A [`Probe`] is shared by every task of a test batch. Bodies built through
//! [`Probe::task`] record when they start and finish (in tokio time, so
//! paused-clock tests stay exact) and the descriptor's callbacks record each
//! invocation. Tests then assert on ordering and overlap.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use initdag::{TaskContext, TaskDescriptor, TaskState};

/// What a probe body does once its work time has elapsed.
#[derive(Debug, Clone)]
pub enum Outcome {
    Succeed,
    ReturnFalse,
    Raise(String),
    Panic(String),
    /// Never finishes on its own; only a timeout ends it.
    Hang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEvent {
    Started(String),
    Finished(String),
    OnSuccess(String),
    OnFailure(String, String),
    /// A body read a peer's state through its `TaskContext`.
    Observed {
        task: String,
        peer: String,
        state: Option<TaskState>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Probe {
    events: Arc<Mutex<Vec<(ProbeEvent, Instant)>>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: ProbeEvent) {
        self.events.lock().unwrap().push((event, Instant::now()));
    }

    pub fn events(&self) -> Vec<ProbeEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(e, _)| e.clone())
            .collect()
    }

    /// Task ids in the order their bodies started.
    pub fn start_order(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProbeEvent::Started(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn started(&self, id: &str) -> bool {
        self.start_order().iter().any(|s| s == id)
    }

    pub fn started_at(&self, id: &str) -> Option<Instant> {
        self.find(|e| matches!(e, ProbeEvent::Started(t) if t == id))
    }

    pub fn finished_at(&self, id: &str) -> Option<Instant> {
        self.find(|e| matches!(e, ProbeEvent::Finished(t) if t == id))
    }

    /// Whether the body windows of `a` and `b` intersect.
    pub fn overlapped(&self, a: &str, b: &str) -> bool {
        match (
            self.started_at(a),
            self.finished_at(a),
            self.started_at(b),
            self.finished_at(b),
        ) {
            (Some(sa), Some(fa), Some(sb), Some(fb)) => sa < fb && sb < fa,
            _ => false,
        }
    }

    pub fn success_calls(&self, id: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProbeEvent::OnSuccess(t) if t == id))
            .count()
    }

    pub fn failure_calls(&self, id: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProbeEvent::OnFailure(t, _) if t == id))
            .count()
    }

    /// Error messages handed to `on_failure` for `id`.
    pub fn failure_messages(&self, id: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProbeEvent::OnFailure(t, msg) if t == id => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn find(&self, pred: impl Fn(&ProbeEvent) -> bool) -> Option<Instant> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|(e, _)| pred(e))
            .map(|(_, at)| *at)
    }

    /// Descriptor whose body sleeps for `work`, then ends with `outcome`.
    /// Both callbacks are wired to this probe.
    pub fn task(&self, id: &str, work: Duration, outcome: Outcome) -> TaskDescriptor {
        let body_probe = self.clone();
        let ok_probe = self.clone();
        let err_probe = self.clone();
        let ok_id = id.to_string();
        let err_id = id.to_string();

        TaskDescriptor::new(id, move |ctx: TaskContext| {
            let probe = body_probe.clone();
            let outcome = outcome.clone();
            async move {
                let id = ctx.id().to_string();
                probe.record(ProbeEvent::Started(id.clone()));
                tokio::time::sleep(work).await;
                if matches!(outcome, Outcome::Hang) {
                    std::future::pending::<()>().await;
                }
                probe.record(ProbeEvent::Finished(id));
                match outcome {
                    Outcome::Succeed => Ok(true),
                    Outcome::ReturnFalse => Ok(false),
                    Outcome::Raise(msg) => Err(anyhow::anyhow!(msg)),
                    Outcome::Panic(msg) => panic!("{msg}"),
                    Outcome::Hang => unreachable!(),
                }
            }
        })
        .on_success(move || ok_probe.record(ProbeEvent::OnSuccess(ok_id.clone())))
        .on_failure(move |err| {
            err_probe.record(ProbeEvent::OnFailure(err_id.clone(), err.to_string()))
        })
    }

    /// Shorthand for a body that succeeds after `work`.
    pub fn ok(&self, id: &str, work: Duration) -> TaskDescriptor {
        self.task(id, work, Outcome::Succeed)
    }

    /// Body that records the state of each `peer` as seen through its
    /// context, then succeeds. Start and finish are recorded as for
    /// [`Probe::task`]; callbacks are not wired.
    pub fn observer(&self, id: &str, peers: &[&str]) -> TaskDescriptor {
        let probe = self.clone();
        let peers: Vec<String> = peers.iter().map(|p| p.to_string()).collect();
        TaskDescriptor::new(id, move |ctx: TaskContext| {
            let probe = probe.clone();
            let peers = peers.clone();
            async move {
                let id = ctx.id().to_string();
                probe.record(ProbeEvent::Started(id.clone()));
                for peer in peers {
                    probe.record(ProbeEvent::Observed {
                        task: id.clone(),
                        state: ctx.state_of(&peer),
                        peer,
                    });
                }
                probe.record(ProbeEvent::Finished(id));
                Ok(true)
            }
        })
    }
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
