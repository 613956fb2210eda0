// src/geocoding/rate_limiter.rs
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Serializes outbound requests with a fixed minimum gap. The gap applies
/// across different addresses, not only between retries of one address.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub async fn wait(&self) {
        let mut guard = self.last_call.lock().await;
        if let Some(prev) = *guard {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *guard = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spaces_out_calls() {
        let limiter = RateLimiter::new(Duration::from_millis(40));
        let started = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;
        // first call is free, the next two each wait a full interval
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_zero_interval_never_sleeps() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let started = Instant::now();
        for _ in 0..100 {
            limiter.wait().await;
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
