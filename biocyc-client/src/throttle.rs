//! Process-wide minimum-interval gate on outbound fetches.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Minimum-interval throttle shared by every entity and organism in a
/// context: one budget, not one per organism.
///
/// `acquire` serializes the *start* of outbound fetches. It makes no
/// promise about which waiting caller is granted first beyond the fair
/// queueing of the underlying lock.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_grant: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until at least `min_interval` has elapsed since the start of
    /// the previously granted acquire, then record the new grant. The
    /// state lock is held across the wait, so two grants can never
    /// observe overlapping windows.
    pub async fn acquire(&self) {
        let mut last = self.last_grant.lock().await;
        if let Some(prev) = *last {
            let ready = prev + self.min_interval;
            let now = Instant::now();
            if ready > now {
                trace!(wait_ms = (ready - now).as_millis() as u64, "throttling fetch");
                sleep_until(ready).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sequential_acquires_are_spaced() {
        let throttle = Throttle::new(Duration::from_secs(1));

        throttle.acquire().await;
        let first = Instant::now();
        throttle.acquire().await;
        let second = Instant::now();

        assert!(second - first >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_does_not_wait() {
        let throttle = Throttle::new(Duration::from_secs(5));
        let before = Instant::now();
        throttle.acquire().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_never_waits() {
        let throttle = Throttle::new(Duration::ZERO);
        let before = Instant::now();
        for _ in 0..10 {
            throttle.acquire().await;
        }
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquires_keep_min_interval() {
        use std::sync::Arc;
        use tokio::sync::Mutex as AsyncMutex;

        let throttle = Arc::new(Throttle::new(Duration::from_secs(1)));
        let grants: Arc<AsyncMutex<Vec<Instant>>> = Arc::new(AsyncMutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let throttle = Arc::clone(&throttle);
            let grants = Arc::clone(&grants);
            handles.push(tokio::spawn(async move {
                throttle.acquire().await;
                grants.lock().await.push(Instant::now());
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut times = grants.lock().await.clone();
        times.sort();
        assert_eq!(times.len(), 5);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(1));
        }
    }
}
