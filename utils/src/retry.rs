//! Bounded constant-backoff retry for async operations.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Run `op` up to `retries + 1` times, sleeping `backoff` between attempts.
///
/// Returns the first success, or the last error once attempts run out.
/// `should_retry` decides whether an error is worth another attempt; a
/// `false` answer returns that error immediately.
pub async fn retry_constant<F, Fut, T, E>(
    retries: usize,
    backoff: Duration,
    mut should_retry: impl FnMut(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut remaining = retries;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if remaining == 0 || !should_retry(&err) {
                    return Err(err);
                }
                remaining -= 1;
                sleep(backoff).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);
        let result: Result<u32, &str> = retry_constant(2, Duration::from_millis(1), |_| true, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 2 { Err("not yet") } else { Ok(7) } }
        })
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_retries() {
        let calls = AtomicUsize::new(0);
        let result: Result<u32, &str> = retry_constant(2, Duration::from_millis(1), |_| true, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("never") }
        })
        .await;
        assert_eq!(result, Err("never"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_error_stops_immediately() {
        let calls = AtomicUsize::new(0);
        let result: Result<u32, &str> =
            retry_constant(5, Duration::from_millis(1), |e| *e != "fatal", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("fatal") }
            })
            .await;
        assert_eq!(result, Err("fatal"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
