use crate::sample::TimePoint;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Declares how a clock's successive samples relate to each other, so
/// snapshot merging knows what ordering guarantee it can rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTraits {
    /// Two samples taken on the same thread in program order are always
    /// strictly increasing.
    StrictlyIncreasingPerThread,
    /// Two samples taken on the same thread in program order never
    /// decrease, but may tie.
    NonDecreasingPerThread,
    /// No ordering guarantee at all.
    NotMonotonic,
}

/// A pluggable time source. The hot producer path only ever calls
/// [`Clock::query`]; [`Clock::make_time_point`] runs once per sample
/// during snapshot construction and may do arbitrary bounded work.
pub trait Clock {
    /// Opaque, trivially-copyable producer-side sample. `Send` so a
    /// per-thread storage adapter's ring can be drained from the
    /// consumer thread while a different thread keeps producing into it.
    type Sample: Copy + Send;

    /// Samples the clock. Called on the hot path — must be cheap.
    fn query(&self) -> Self::Sample;

    /// Converts a producer-side sample into an absolute [`TimePoint`].
    /// Called once per sample, during snapshot construction.
    fn make_time_point(&self, sample: Self::Sample) -> TimePoint;

    /// This clock's monotonicity guarantee.
    fn traits(&self) -> ClockTraits;
}

/// Monotonic clock anchored against a `SystemTime` epoch snapshot taken
/// once at construction, so `make_time_point` can report nanoseconds
/// since the Unix epoch without paying for a `SystemTime::now()` call on
/// every `query()`.
pub struct MonotonicClock {
    instant_epoch: Instant,
    system_epoch_nanos: u64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        let instant_epoch = Instant::now();
        let system_epoch_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        Self {
            instant_epoch,
            system_epoch_nanos,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    type Sample = Instant;

    #[inline]
    fn query(&self) -> Self::Sample {
        Instant::now()
    }

    fn make_time_point(&self, sample: Self::Sample) -> TimePoint {
        let elapsed = sample
            .checked_duration_since(self.instant_epoch)
            .unwrap_or_default();
        TimePoint(self.system_epoch_nanos + elapsed.as_nanos() as u64)
    }

    fn traits(&self) -> ClockTraits {
        ClockTraits::StrictlyIncreasingPerThread
    }
}

/// Raw wall-clock, suitable when `Instant`'s process-local anchor is
/// undesirable. Two back-to-back `SystemTime::now()` calls can tie on
/// some platforms, so this clock is only non-decreasing, not strict.
pub struct SystemClock;

impl Clock for SystemClock {
    type Sample = SystemTime;

    #[inline]
    fn query(&self) -> Self::Sample {
        SystemTime::now()
    }

    fn make_time_point(&self, sample: Self::Sample) -> TimePoint {
        let nanos = sample
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        TimePoint(nanos)
    }

    fn traits(&self) -> ClockTraits {
        ClockTraits::NonDecreasingPerThread
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_time_points_increase() {
        let clock = MonotonicClock::new();
        let a = clock.query();
        std::thread::sleep(std::time::Duration::from_micros(10));
        let b = clock.query();

        let ta = clock.make_time_point(a);
        let tb = clock.make_time_point(b);
        assert!(tb > ta);
    }
}
