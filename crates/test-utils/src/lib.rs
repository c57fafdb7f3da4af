//! Shared helpers for `initdag` tests.
//!
//! - [`builders`]: batch-file model builders and temp-file fixtures.
//! - [`probe`]: instrumented task bodies that record start/finish windows and
//!   callback invocations.

pub mod builders;
pub mod probe;

use std::sync::Once;
use std::time::Duration;

use initdag::logging::LOG_ENV;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Upper bound for any single awaited batch in a test.
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

/// Install a test-writer subscriber once per test binary.
///
/// Reads the same `INITDAG_LOG` variable as the binary, so
/// `INITDAG_LOG=initdag=debug cargo test -- --nocapture` shows engine logs.
/// Defaults to `warn` to keep failing-test output short.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it outlives [`TEST_DEADLINE`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(TEST_DEADLINE, f)
        .await
        .unwrap_or_else(|_| panic!("batch did not finish within {TEST_DEADLINE:?}"))
}
