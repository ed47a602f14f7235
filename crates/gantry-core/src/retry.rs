//! Bounded retry for operations that fail transiently

use std::future::Future;

use tracing::debug;

/// Run `op` up to `attempts` times, returning the first success or the last
/// error. No delay between attempts; callers that need pacing sleep inside
/// `op`.
pub async fn with_retry<T, E, F, Fut>(attempts: u32, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    debug_assert!(attempts > 0);
    let mut remaining = attempts;
    loop {
        remaining -= 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(_) if remaining > 0 => {
                debug!(remaining, "attempt failed, retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_retry(3, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        })
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_retry(3, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err("not yet")
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_after_exactly_n_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = with_retry(3, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("always")
        })
        .await;
        assert_eq!(result, Err("always"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
