//! Timeouts and polling for async tests

use std::future::Future;

use thiserror::Error;
use tokio::time::{sleep, timeout, Duration, Instant};

/// Generous bound for scenario tests that fan out hundreds of operations
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound for things that should already be true or nearly so
pub const SHORT_TEST_TIMEOUT: Duration = Duration::from_millis(200);

const POLL_INTERVAL: Duration = Duration::from_millis(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("not done within {0:?}")]
pub struct TimedOut(pub Duration);

/// Run `future`, failing with [`TimedOut`] after `duration`
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    timeout(duration, future).await.map_err(|_| TimedOut(duration))
}

/// Panic unless `future` finishes within `duration`
pub async fn assert_completes_within<F, T>(duration: Duration, future: F) -> T
where
    F: Future<Output = T>,
{
    match with_timeout(duration, future).await {
        Ok(result) => result,
        Err(e) => panic!("future {}", e),
    }
}

/// Poll `condition` until it holds or `duration` passes
pub async fn wait_until<C>(duration: Duration, mut condition: C) -> Result<(), TimedOut>
where
    C: FnMut() -> bool,
{
    let deadline = Instant::now() + duration;
    while !condition() {
        if Instant::now() >= deadline {
            return Err(TimedOut(duration));
        }
        sleep(POLL_INTERVAL).await;
    }
    Ok(())
}
