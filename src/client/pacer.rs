//! Outbound request pacing.
//!
//! [`Pacer`] is a single-slot gate shared by every request one client
//! sends. It holds the time of the last dispatch behind a
//! [`tokio::sync::Mutex`]; a caller keeps the lock while it sleeps out the
//! remaining interval, so concurrent callers queue in FIFO order and leave
//! at least `min_interval` apart.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval gate for outbound requests.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl Pacer {
    /// Creates a gate that spaces dispatches by `min_interval`.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Returns the configured spacing.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits for this caller's turn and records the dispatch time.
    ///
    /// Call immediately before sending. If the returned future is dropped
    /// while waiting, the recorded time is left untouched and the next
    /// caller in line proceeds.
    pub async fn acquire(&self) {
        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                tracing::debug!(
                    wait_ms = u64::try_from((ready_at - now).as_millis()).unwrap_or(u64::MAX),
                    "pacing outbound request"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_does_not_wait() {
        let pacer = Pacer::new(Duration::from_secs(1));
        let start = Instant::now();
        pacer.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_acquires_are_spaced() {
        let pacer = Pacer::new(Duration::from_millis(1_000));
        let start = Instant::now();
        pacer.acquire().await;
        pacer.acquire().await;
        pacer.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_idle_time_counts_toward_interval() {
        let pacer = Pacer::new(Duration::from_millis(1_000));
        pacer.acquire().await;
        tokio::time::advance(Duration::from_millis(700)).await;
        let before = Instant::now();
        pacer.acquire().await;
        let waited = before.elapsed();
        assert!(waited >= Duration::from_millis(300));
        assert!(waited < Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_serialized() {
        let pacer = Arc::new(Pacer::new(Duration::from_millis(500)));
        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let pacer = Arc::clone(&pacer);
            handles.push(tokio::spawn(async move {
                pacer.acquire().await;
                Instant::now()
            }));
        }
        let mut times = Vec::new();
        for handle in handles {
            let Ok(at) = handle.await else {
                panic!("task panicked");
            };
            times.push(at);
        }
        times.sort();
        for (k, at) in times.iter().enumerate() {
            let earliest = Duration::from_millis(500) * u32::try_from(k).unwrap_or(u32::MAX);
            assert!(at.duration_since(start) >= earliest);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_wait_leaves_gate_consistent() {
        let pacer = Pacer::new(Duration::from_millis(1_000));
        pacer.acquire().await;
        let first = Instant::now();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(100), pacer.acquire()).await;
        assert!(abandoned.is_err());

        pacer.acquire().await;
        assert!(first.elapsed() >= Duration::from_millis(1_000));
        assert!(first.elapsed() < Duration::from_millis(1_100));
    }
}
