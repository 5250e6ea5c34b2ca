//! Global request throttle shared by every worker of an engine

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::Quota;
use std::num::NonZeroU32;
use tokio_util::sync::CancellationToken;

type DirectRateLimiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Returned when a permit wait is abandoned because the crawl was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Token bucket with a burst of one
///
/// Permits are spaced at least `1 / requests_per_second` apart across all
/// callers, so the whole pool never exceeds the configured rate.
pub struct RateLimiter {
    inner: DirectRateLimiter,
}

impl RateLimiter {
    /// Creates a limiter; a rate of zero is treated as one request per second
    pub fn new(requests_per_second: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rate).allow_burst(NonZeroU32::MIN);

        Self {
            inner: governor::RateLimiter::direct(quota),
        }
    }

    /// Waits for a permit
    ///
    /// Cancellation is checked before the bucket, so a token that is already
    /// cancelled never consumes a permit.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Cancelled),
            _ = self.inner.until_ready() => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_first_permit_is_immediate() {
        let limiter = RateLimiter::new(1);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_permits_are_spaced() {
        let limiter = RateLimiter::new(10);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire(&cancel).await.unwrap();
        }
        // Burst of one: permits 2..4 each wait ~100ms
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_rate_is_shared_across_tasks() {
        let limiter = Arc::new(RateLimiter::new(20));
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire(&cancel).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // 8 permits at 20/s need at least 7 gaps of 50ms
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_cancelled_wait_returns_error() {
        let limiter = RateLimiter::new(1);
        let cancel = CancellationToken::new();
        limiter.acquire(&cancel).await.unwrap();

        let waiter = {
            let cancel = cancel.clone();
            async move { limiter.acquire(&cancel).await }
        };
        let handle = tokio::spawn(waiter);
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        assert_eq!(handle.await.unwrap(), Err(Cancelled));
    }

    #[tokio::test]
    async fn test_already_cancelled_consumes_nothing() {
        let limiter = RateLimiter::new(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(limiter.acquire(&cancel).await, Err(Cancelled));

        // The single burst permit is still available
        let fresh = CancellationToken::new();
        let start = Instant::now();
        limiter.acquire(&fresh).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_zero_rate_is_clamped() {
        let limiter = RateLimiter::new(0);
        let cancel = CancellationToken::new();

        // Clamped to one per second: the first permit is free, the second waits
        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(200));

        let second =
            tokio::time::timeout(Duration::from_millis(300), limiter.acquire(&cancel)).await;
        assert!(second.is_err());
    }
}
