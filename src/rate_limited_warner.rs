//! Rate limiting for repeated failure warnings.
//!
//! A dead backend fails every record. [`RateLimitedWarner`] lets the first
//! failure through immediately, then at most one per interval, counting the
//! ones it swallowed so the next warning can say how many were suppressed.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// Default interval between rate-limited warnings.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

const NEVER: u64 = u64::MAX;

pub struct RateLimitedWarner {
    start: Instant,
    interval_ms: u64,
    /// Milliseconds since `start` of the last emitted warning.
    last_warn: AtomicU64,
    suppressed: AtomicU64,
}

impl RateLimitedWarner {
    /// Create a warner that emits at most one warning per `interval`. The
    /// first warning is emitted immediately.
    pub fn new(interval: Duration) -> Self {
        Self {
            start: Instant::now(),
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            last_warn: AtomicU64::new(NEVER),
            suppressed: AtomicU64::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX - 1)
    }

    /// Call `warn` with the number of warnings suppressed since the previous
    /// one if the interval has elapsed; otherwise count this one as
    /// suppressed. Returns whether `warn` ran.
    pub fn warn_if_due(&self, warn: impl FnOnce(u64)) -> bool {
        let now = self.now_ms();
        let prev = self.last_warn.load(Ordering::Relaxed);
        let due = prev == NEVER || now.saturating_sub(prev) >= self.interval_ms;
        if due
            && self
                .last_warn
                .compare_exchange(prev, now, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
        {
            warn(self.suppressed.swap(0, Ordering::Relaxed));
            return true;
        }
        self.suppressed.fetch_add(1, Ordering::Relaxed);
        false
    }

    /// Immediately report the number of suppressed warnings, if any.
    pub fn flush(&self, warn: impl FnOnce(u64)) {
        let count = self.suppressed.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
            self.last_warn.store(self.now_ms(), Ordering::Relaxed);
        }
    }
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_first_warning_immediately() {
        let warner = RateLimitedWarner::new(Duration::from_secs(60));
        let mut warnings = Vec::new();
        assert!(warner.warn_if_due(|c| warnings.push(c)));
        assert_eq!(warnings, vec![0]);
    }

    #[test]
    fn rate_limits_subsequent_warnings() {
        let warner = RateLimitedWarner::new(Duration::from_secs(60));
        let mut warnings = Vec::new();
        warner.warn_if_due(|c| warnings.push(c));
        assert!(!warner.warn_if_due(|c| warnings.push(c)));
        assert!(!warner.warn_if_due(|c| warnings.push(c)));
        assert_eq!(warnings, vec![0]);
    }

    #[test]
    fn zero_interval_reports_suppressed_count() {
        let warner = RateLimitedWarner::new(Duration::ZERO);
        let mut warnings = Vec::new();
        warner.warn_if_due(|c| warnings.push(c));
        warner.warn_if_due(|c| warnings.push(c));
        assert_eq!(warnings, vec![0, 0]);
    }

    #[test]
    fn flush_emits_pending_count() {
        let warner = RateLimitedWarner::new(Duration::from_secs(60));
        let mut warnings = Vec::new();
        warner.warn_if_due(|_| {});
        warner.warn_if_due(|_| {});
        warner.warn_if_due(|_| {});
        warner.flush(|c| warnings.push(c));
        assert_eq!(warnings, vec![2]);
        warner.flush(|c| warnings.push(c));
        assert_eq!(warnings, vec![2]);
    }
}
