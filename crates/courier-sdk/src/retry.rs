use std::time::Duration;

/// Backoff between trace reconnects. The reader never reconnects by itself;
/// callers consult this after a server-side close.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    attempt: u32,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_attempts: None,
            attempt: 0,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay before the next attempt, or `None` once attempts are exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| self.attempt >= max) {
            return None;
        }

        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.multiplier.powi(self.attempt as i32);
        let capped = delay_ms.min(self.max_delay.as_millis() as f64);

        // Up to 10% jitter so several consoles don't reconnect in lockstep.
        let jitter = capped * 0.1 * jitter_factor();

        self.attempt += 1;
        Some(Duration::from_millis((capped + jitter) as u64))
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

fn jitter_factor() -> f64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}
