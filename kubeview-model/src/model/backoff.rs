use std::time::Duration;

use tokio::time::Instant;

use crate::config::BackoffConfig;

/// Shortest delay ever handed out, whatever the configured intervals.
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    RetryAfter(Duration),
    GiveUp,
}

/// Exponential backoff bounded by a max interval, an elapsed-time budget and
/// an optional attempt budget.
///
/// The elapsed budget is measured from the first failure since the last
/// `reset`.
#[derive(Debug, Clone)]
pub struct ExpBackoff {
    initial: Duration,
    multiplier: f64,
    max_interval: Duration,
    max_elapsed: Option<Duration>,
    max_attempts: Option<u32>,
    current: Duration,
    attempts: u32,
    started: Option<Instant>,
}

impl ExpBackoff {
    pub fn new(initial: Duration, max_interval: Duration, max_elapsed: Option<Duration>) -> Self {
        let initial = initial.max(MIN_INTERVAL);
        let max_interval = max_interval.max(initial);
        Self {
            initial,
            multiplier: 1.5,
            max_interval,
            max_elapsed,
            max_attempts: None,
            current: initial,
            attempts: 0,
            started: None,
        }
    }

    pub fn from_config(cfg: &BackoffConfig) -> Self {
        let max_elapsed = (cfg.max_elapsed_secs > 0).then(|| Duration::from_secs(cfg.max_elapsed_secs));
        Self::new(
            Duration::from_millis(cfg.initial_interval_ms),
            Duration::from_secs(cfg.max_interval_secs),
            max_elapsed,
        )
        .with_multiplier(cfg.multiplier)
        .with_max_attempts(cfg.max_attempts)
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Records a failure and returns the delay before the next attempt.
    pub fn next_backoff(&mut self) -> Backoff {
        let started = *self.started.get_or_insert_with(Instant::now);
        self.attempts += 1;
        if self.max_attempts.is_some_and(|max| self.attempts >= max) {
            return Backoff::GiveUp;
        }

        let delay = self.current;
        if let Some(max) = self.max_elapsed {
            if started.elapsed() + delay > max {
                return Backoff::GiveUp;
            }
        }
        let next = self.current.as_nanos() as f64 * self.multiplier;
        self.current = Duration::from_nanos(next as u64).min(self.max_interval);

        Backoff::RetryAfter(delay)
    }

    /// Back to the initial interval, with fresh budgets.
    pub fn reset(&mut self) {
        self.current = self.initial;
        self.attempts = 0;
        self.started = None;
    }
}
