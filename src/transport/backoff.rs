//! Reconnection delays for [`ReconnectingTransport`](super::ReconnectingTransport).

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Default base delay for exponential backoff.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(100);
/// Default maximum delay between reconnection attempts.
pub const DEFAULT_BACKOFF_CAP: Duration = Duration::from_secs(10);
/// Default duration of healthy writes that resets backoff state.
pub const DEFAULT_BACKOFF_RESET: Duration = Duration::from_secs(30);
/// Default window after the first failure during which reconnects are tried.
pub const DEFAULT_BACKOFF_DEADLINE: Duration = Duration::from_secs(120);

/// Exponential backoff policy for reconnection attempts.
#[derive(Clone, Debug)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub reset_after: Duration,
    pub deadline: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BACKOFF_BASE,
            cap: DEFAULT_BACKOFF_CAP,
            reset_after: DEFAULT_BACKOFF_RESET,
            deadline: DEFAULT_BACKOFF_DEADLINE,
        }
    }
}

/// Shortest delay ever handed out.
const MIN_DELAY_MS: u64 = 10;

/// Tracks consecutive reconnection failures and produces jittered delays.
///
/// The delay ceiling doubles with every failure up to `cap`. Once sends have
/// stayed healthy for `reset_after` the attempt count starts over.
pub struct BackoffState {
    policy: BackoffPolicy,
    attempt: u32,
    first_failure: Option<Instant>,
    recovered_at: Option<Instant>,
    rng: StdRng,
}

impl BackoffState {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            first_failure: None,
            recovered_at: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Record a successful send.
    pub fn record_success(&mut self, now: Instant) {
        if self.first_failure.is_none() {
            return;
        }
        let since = *self.recovered_at.get_or_insert(now);
        if now.duration_since(since) >= self.policy.reset_after {
            self.restart();
        }
    }

    /// Longest delay the policy allows.
    pub fn cap(&self) -> Duration {
        self.policy.cap
    }

    /// Forget the current outage so the next failure starts from `base`.
    pub fn restart(&mut self) {
        self.attempt = 0;
        self.first_failure = None;
        self.recovered_at = None;
    }

    /// Record a failure and return the delay before the next attempt, or
    /// `None` once `deadline` has passed since the first failure.
    pub fn next_delay(&mut self, now: Instant) -> Option<Duration> {
        let first = *self.first_failure.get_or_insert(now);
        self.recovered_at = None;
        if now.duration_since(first) >= self.policy.deadline {
            return None;
        }
        let ceiling = self.ceiling();
        self.attempt = self.attempt.saturating_add(1);
        Some(self.jitter(ceiling))
    }

    fn ceiling(&self) -> Duration {
        let factor = 1u32.checked_shl(self.attempt).unwrap_or(u32::MAX);
        self.policy.base.saturating_mul(factor).min(self.policy.cap)
    }

    fn jitter(&mut self, ceiling: Duration) -> Duration {
        let max_ms = u64::try_from(ceiling.as_millis())
            .unwrap_or(u64::MAX)
            .max(MIN_DELAY_MS);
        if max_ms == MIN_DELAY_MS {
            return Duration::from_millis(MIN_DELAY_MS);
        }
        Duration::from_millis(self.rng.gen_range(MIN_DELAY_MS..=max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn policy(base_ms: u64, cap_ms: u64, deadline_ms: u64) -> BackoffPolicy {
        BackoffPolicy {
            base: Duration::from_millis(base_ms),
            cap: Duration::from_millis(cap_ms),
            reset_after: Duration::from_millis(50),
            deadline: Duration::from_millis(deadline_ms),
        }
    }

    #[rstest]
    #[case(0, 0)]
    #[case(5, 5)]
    #[case(10, 10)]
    fn delays_never_drop_below_minimum(#[case] base_ms: u64, #[case] cap_ms: u64) {
        let mut backoff = BackoffState::new(policy(base_ms, cap_ms, 1_000));
        let delay = backoff.next_delay(Instant::now()).expect("first delay");
        assert_eq!(delay, Duration::from_millis(MIN_DELAY_MS));
    }

    #[test]
    fn gives_up_after_deadline() {
        let mut backoff = BackoffState::new(policy(10, 10, 20));
        let now = Instant::now();
        assert!(backoff.next_delay(now).is_some());
        assert!(backoff.next_delay(now + Duration::from_millis(25)).is_none());
    }

    #[test]
    fn ceiling_doubles_up_to_cap() {
        let mut backoff = BackoffState::new(policy(20, 80, 10_000));
        let start = Instant::now();
        let mut ceilings = Vec::new();
        for step in 0..5u64 {
            ceilings.push(backoff.ceiling());
            let delay = backoff
                .next_delay(start + Duration::from_millis(step))
                .expect("within deadline");
            assert!(delay <= Duration::from_millis(80), "delay {delay:?}");
        }
        let ms: Vec<_> = ceilings.iter().map(Duration::as_millis).collect();
        assert_eq!(ms, [20, 40, 80, 80, 80]);
    }

    #[test]
    fn sustained_success_restarts_backoff() {
        let mut backoff = BackoffState::new(policy(20, 80, 10_000));
        let start = Instant::now();
        backoff.next_delay(start);
        backoff.next_delay(start + Duration::from_millis(1));
        backoff.record_success(start + Duration::from_millis(60));
        assert_eq!(backoff.attempt, 2, "a single success is not enough");
        backoff.record_success(start + Duration::from_millis(120));
        assert_eq!(backoff.attempt, 0);
        assert!(backoff.first_failure.is_none());
    }

    #[test]
    fn failure_interrupts_recovery() {
        let mut backoff = BackoffState::new(policy(20, 80, 10_000));
        let start = Instant::now();
        backoff.next_delay(start);
        backoff.record_success(start + Duration::from_millis(10));
        backoff.next_delay(start + Duration::from_millis(20));
        backoff.record_success(start + Duration::from_millis(40));
        backoff.record_success(start + Duration::from_millis(80));
        assert_eq!(backoff.attempt, 2);
    }
}
