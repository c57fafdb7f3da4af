#![allow(dead_code, unused_imports)]

pub use initdag_test_utils::builders;
pub use initdag_test_utils::probe::{Outcome, Probe, ProbeEvent, ms};
pub use initdag_test_utils::{init_tracing, with_timeout};

use tokio::sync::mpsc;

use initdag::BatchEvent;

/// Drain every event already queued on a subscription.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<BatchEvent>) -> Vec<BatchEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}
