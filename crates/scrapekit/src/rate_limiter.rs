use std::time::Duration;
use tokio::time::Instant;

/// Keeps consecutive requests at least `interval` apart.
///
/// The interval runs from one attempt start to the next, so the timestamp is
/// recorded after waiting and before the request goes out.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: None,
        }
    }

    pub fn last_request(&self) -> Option<Instant> {
        self.last_request
    }

    /// How long a request issued at `now` has to wait.
    pub fn wait_time(&self, now: Instant) -> Duration {
        if self.interval.is_zero() {
            return Duration::ZERO;
        }

        match self.last_request {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    pub async fn throttle(&mut self) {
        let wait = self.wait_time(Instant::now());
        if !wait.is_zero() {
            tracing::debug!("Rate limit: waiting {:?} before next request", wait);
            tokio::time::sleep(wait).await;
        }
        self.last_request = Some(Instant::now());
    }
}
