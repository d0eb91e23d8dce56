//! Client-side sliding-window rate limiter.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Default number of requests allowed per window.
pub(crate) const DEFAULT_MAX_REQUESTS: usize = 10;

/// Default window length.
pub(crate) const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

/// Extra delay added to every computed wait.
const WAIT_BUFFER: Duration = Duration::from_millis(100);

/// Sliding-window rate limiter.
///
/// Keeps the timestamps of the most recent requests. When the window is
/// full, [`RateLimiter::enforce`] sleeps until the oldest timestamp has
/// aged out, so no more than `max_requests` leave in any trailing
/// `window`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct RateLimiter {
    /// Requests allowed per window.
    max_requests: usize,
    /// Window length.
    window: Duration,
    /// Timestamps of recent requests, oldest first.
    timestamps: VecDeque<Instant>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window`.
    ///
    /// A `max_requests` of zero is treated as one.
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            max_requests,
            window,
            timestamps: VecDeque::with_capacity(max_requests),
        }
    }

    /// Creates a limiter with the upstream limit (10 requests / 10s).
    #[must_use]
    pub fn default_window() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }

    /// Waits until one more request fits in the window, then records it.
    ///
    /// Never fails; it only delays.
    pub async fn enforce(&mut self) {
        let now = Instant::now();
        self.evict(now);

        if let Some(wait) = self.required_wait(now) {
            tracing::warn!(
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                window_len = self.timestamps.len(),
                "Client-side rate limit reached. Waiting..."
            );
            tokio::time::sleep(wait).await;
        }

        self.timestamps.push_back(Instant::now());
        while self.timestamps.len() > self.max_requests {
            self.timestamps.pop_front();
        }
    }

    /// Number of timestamps currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Returns `true` if no request has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Drops timestamps older than the window.
    fn evict(&mut self, now: Instant) {
        while self
            .timestamps
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) > self.window)
        {
            self.timestamps.pop_front();
        }
    }

    /// Computes how long to sleep before the next request, if at all.
    fn required_wait(&self, now: Instant) -> Option<Duration> {
        if self.timestamps.len() < self.max_requests {
            return None;
        }
        let oldest = *self.timestamps.front()?;
        let elapsed = now.saturating_duration_since(oldest);
        let wait = self
            .window
            .saturating_sub(elapsed)
            .saturating_add(WAIT_BUFFER);
        (!wait.is_zero()).then_some(wait)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::default_window()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    #[tokio::test]
    async fn test_first_request_no_wait() {
        // Arrange
        let mut limiter = RateLimiter::default_window();

        // Act
        let start = Instant::now();
        limiter.enforce().await;
        let elapsed = start.elapsed();

        // Assert
        assert!(elapsed < Duration::from_millis(100));
        assert_eq!(limiter.len(), 1);
    }

    #[tokio::test]
    async fn test_full_window_does_not_block_until_exceeded() {
        // Arrange
        let mut limiter = RateLimiter::new(10, Duration::from_secs(5));

        // Act
        let start = Instant::now();
        for _ in 0..10 {
            limiter.enforce().await;
        }
        let elapsed = start.elapsed();

        // Assert
        assert!(elapsed < Duration::from_secs(1));
        assert_eq!(limiter.len(), 10);
    }

    #[tokio::test]
    async fn test_eleventh_call_waits_for_window() {
        // Arrange
        let window = Duration::from_millis(300);
        let mut limiter = RateLimiter::new(10, window);
        let mut issued: Vec<Instant> = Vec::new();

        // Act
        for _ in 0..12 {
            limiter.enforce().await;
            issued.push(Instant::now());
        }

        // Assert: the 11th request leaves at least one window after the 1st
        assert!(issued[10].duration_since(issued[0]) >= window);
        assert!(issued[11].duration_since(issued[1]) >= window);
        assert_eq!(limiter.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_window_spaces_eleventh_call_by_ten_seconds() {
        // Arrange
        let mut limiter = RateLimiter::default_window();
        let mut issued: Vec<Instant> = Vec::new();

        // Act
        for _ in 0..12 {
            limiter.enforce().await;
            issued.push(Instant::now());
        }

        // Assert
        assert!(issued[9].duration_since(issued[0]) < Duration::from_secs(1));
        assert!(issued[10].duration_since(issued[0]) >= Duration::from_secs(10));
        assert!(issued[11].duration_since(issued[1]) >= Duration::from_secs(10));
        assert_eq!(limiter.len(), DEFAULT_MAX_REQUESTS);
    }

    #[tokio::test]
    async fn test_window_never_exceeds_capacity() {
        // Arrange
        let mut limiter = RateLimiter::new(3, Duration::from_millis(50));

        // Act & Assert
        for _ in 0..8 {
            limiter.enforce().await;
            assert!(limiter.len() <= 3);
        }
    }

    #[test]
    fn test_required_wait_empty_window() {
        // Arrange
        let limiter = RateLimiter::default_window();

        // Act & Assert
        assert!(limiter.required_wait(Instant::now()).is_none());
    }

    #[test]
    fn test_required_wait_counts_from_oldest() {
        // Arrange
        let now = Instant::now();
        let mut limiter = RateLimiter::new(2, Duration::from_secs(10));
        limiter.timestamps.push_back(now);
        limiter.timestamps.push_back(now);

        // Act
        let wait = limiter.required_wait(now).unwrap();

        // Assert: full window plus buffer
        assert_eq!(wait, Duration::from_secs(10) + WAIT_BUFFER);
    }

    #[test]
    fn test_evict_drops_expired_entries() {
        // Arrange
        let mut limiter = RateLimiter::new(10, Duration::from_millis(10));
        let old = Instant::now();
        limiter.timestamps.push_back(old);
        std::thread::sleep(Duration::from_millis(20));

        // Act
        limiter.evict(Instant::now());

        // Assert
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        // Arrange & Act
        let limiter = RateLimiter::new(0, DEFAULT_WINDOW);

        // Assert
        assert_eq!(limiter.max_requests, 1);
    }
}
