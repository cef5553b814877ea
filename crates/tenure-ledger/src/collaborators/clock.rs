//! Time sources

use std::sync::atomic::{AtomicU64, Ordering};

use tenure_common::{Timestamp, SECONDS_PER_DAY};

use super::Clock;

/// Wall-clock UTC time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Pre-epoch clocks are treated as the epoch
        chrono::Utc::now().timestamp().max(0) as Timestamp
    }
}

/// Manually driven clock for tests and scenario replay
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `secs`, returning the new time. Saturates at the end
    /// of the timestamp range.
    pub fn advance(&self, secs: u64) -> Timestamp {
        let step = |t: Timestamp| t.saturating_add(secs);
        match self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| Some(step(t)))
        {
            Ok(previous) | Err(previous) => step(previous),
        }
    }

    pub fn advance_days(&self, days: u64) -> Timestamp {
        self.advance(days.saturating_mul(SECONDS_PER_DAY))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.advance(10), 1_010);
        assert_eq!(clock.advance_days(1), 1_010 + SECONDS_PER_DAY);
        clock.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_manual_clock_saturates() {
        let clock = ManualClock::new(Timestamp::MAX - 10);
        assert_eq!(clock.advance(100), Timestamp::MAX);
        assert_eq!(clock.advance_days(u64::MAX), Timestamp::MAX);
        assert_eq!(clock.now(), Timestamp::MAX);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2023-01-01
        assert!(SystemClock.now() > 1_672_531_200);
    }
}
