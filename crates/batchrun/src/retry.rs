//! Capped-attempts retry with fixed or exponential delay.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Delay policy between retry attempts.
#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    /// The same delay after every failed attempt.
    Fixed(Duration),
    /// Delay doubles after each failed attempt, starting here.
    Exponential(Duration),
}

impl Backoff {
    fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed(d) => *d,
            Backoff::Exponential(d) => d.saturating_mul(1u32 << attempt.min(16)),
        }
    }
}

/// Run `op` up to `attempts` times, sleeping between failures according
/// to `backoff`. Returns the first success, or the error from the final
/// attempt once the cap is reached.
pub async fn with_attempts<T, E, F, Fut>(attempts: u32, backoff: Backoff, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let cap = attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt = attempt + 1, attempts = cap, error = %e, "attempt failed");
                attempt += 1;
                if attempt >= cap {
                    return Err(e);
                }
                tokio::time::sleep(backoff.delay_for(attempt - 1)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> =
            with_attempts(3, Backoff::Fixed(Duration::from_millis(1)), || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 1 {
                        Err("not yet".to_string())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cap_is_enforced() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> =
            with_attempts(3, Backoff::Fixed(Duration::from_millis(1)), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("always".to_string()) }
            })
            .await;
        assert_eq!(result.unwrap_err(), "always");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_immediate_success_sleeps_never() {
        let result: Result<u32, String> =
            with_attempts(5, Backoff::Exponential(Duration::from_secs(60)), || async {
                Ok(7)
            })
            .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_exponential_delays_double() {
        let backoff = Backoff::Exponential(Duration::from_millis(100));
        assert_eq!(backoff.delay_for(0), Duration::from_millis(100));
        assert_eq!(backoff.delay_for(1), Duration::from_millis(200));
        assert_eq!(backoff.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn test_fixed_delay_constant() {
        let backoff = Backoff::Fixed(Duration::from_millis(50));
        assert_eq!(backoff.delay_for(0), backoff.delay_for(9));
    }
}
