//! Strictly monotonic microsecond clock
//!
//! Audit timestamps must be strictly increasing: an update's `last_updated`
//! has to be greater than the value assigned at creation even when both
//! happen within the same wall-clock microsecond. The clock keeps an atomic
//! high-water mark and never hands out the same (or an earlier) timestamp
//! twice.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use plinth_core::Timestamp;

/// Wall-clock source with a strictly-increasing guarantee
#[derive(Debug, Default)]
pub(crate) struct MonotonicClock {
    /// Highest timestamp handed out so far, in microseconds
    last: AtomicU64,
}

impl MonotonicClock {
    pub(crate) fn new() -> Self {
        MonotonicClock {
            last: AtomicU64::new(0),
        }
    }

    /// Produce the next timestamp: wall time, bumped past the previous one
    /// if the wall clock has not advanced (or went backwards)
    pub(crate) fn now(&self) -> Timestamp {
        let wall = Utc::now().timestamp_micros().max(0) as u64;
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return Timestamp::from_micros(next),
                Err(observed) => prev = observed,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_strictly_increasing() {
        let clock = MonotonicClock::new();
        let mut prev = clock.now();
        for _ in 0..10_000 {
            let next = clock.now();
            assert!(next.is_after(prev), "clock must never repeat or rewind");
            prev = next;
        }
    }

    #[test]
    fn test_clock_tracks_wall_time() {
        let clock = MonotonicClock::new();
        let ts = clock.now();
        // Sanity: we are well past 2020-01-01 in microseconds.
        assert!(ts.as_micros() > 1_577_836_800_000_000);
    }
}
