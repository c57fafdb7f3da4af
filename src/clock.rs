// src/clock.rs

//! Time source used to measure task and batch durations.
//!
//! Delays and timeouts always go through `tokio::time`; the clock only reads
//! "now". [`TokioClock`] follows tokio's paused time in tests, so durations
//! stay exact under `#[tokio::test(start_paused = true)]`.

use std::fmt::Debug;

use tokio::time::Instant;

pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Default clock backed by `tokio::time::Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
