//! Test harness helpers.

use std::time::{Duration, Instant};

/// Install a test-friendly `tracing` subscriber.
///
/// Output goes through the test writer so it is captured per test. Safe to
/// call from every test; only the first call installs anything. The filter
/// honours `RUST_LOG` and defaults to `switchboard_events=debug`.
pub fn init_test_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("switchboard_events=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Poll `condition` until it holds or `timeout` elapses.
///
/// Returns whether the condition became true.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if condition() {
            return true;
        }
        if deadline.is_none_or(|d| Instant::now() >= d) {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}
