use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Per-connector minimum spacing between outbound calls.
///
/// The read-sleep-update sequence runs under one async mutex, so overlapping
/// calls to the same connector queue up behind each other instead of racing
/// on the last-call timestamp. Different connectors own different limiters.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Option<Duration>,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(per_minute: Option<u32>) -> Self {
        let interval = per_minute
            .filter(|rate| *rate > 0)
            .map(|rate| Duration::from_secs_f64(60.0 / f64::from(rate)));
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Suspends the calling task until the spacing since the previous call has elapsed.
    pub async fn acquire(&self) {
        let Some(interval) = self.interval else {
            return;
        };

        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let ready_at = previous + interval;
            if ready_at > Instant::now() {
                debug!(wait_ms = (ready_at - Instant::now()).as_millis() as u64, "rate limit wait");
                sleep_until(ready_at).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn interval_is_sixty_over_rate() {
        assert_eq!(
            RateLimiter::new(Some(120)).interval(),
            Some(Duration::from_millis(500))
        );
        assert_eq!(RateLimiter::new(Some(0)).interval(), None);
        assert_eq!(RateLimiter::new(None).interval(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_acquires_are_spaced_out() {
        let limiter = Arc::new(RateLimiter::new(Some(60)));
        let started = Instant::now();

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut finished = Vec::new();
        for task in tasks {
            finished.push(task.await.unwrap() - started);
        }
        finished.sort();

        assert!(finished[0] < Duration::from_millis(10));
        assert!(finished[1] >= Duration::from_secs(1));
        assert!(finished[2] >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn unlimited_limiter_never_waits() {
        let limiter = RateLimiter::new(None);
        let started = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
