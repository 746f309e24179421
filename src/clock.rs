//! Millisecond time providers for stamping observations
//!
//! The registry never reads a clock itself; callers pass a timestamp to
//! `observe` or hand a [`Clock`] to `observe_with`. Timestamps are trusted
//! as given, with no skew handling.

use core::cell::Cell;

/// A source of millisecond timestamps, non-decreasing in practice
pub trait Clock {
    /// Current time in milliseconds
    fn now_ms(&self) -> u64;
}

impl<F> Clock for F
where
    F: Fn() -> u64,
{
    #[inline]
    fn now_ms(&self) -> u64 {
        self()
    }
}

/// A clock that only moves when told to
///
/// # Examples
///
/// ```
/// use tinyscan::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(100);
/// clock.advance(5);
/// assert_eq!(clock.now_ms(), 105);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    /// Creates a clock reading `start`
    pub const fn new(start: u64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Jumps to `now`
    pub fn set(&self, now: u64) {
        self.now.set(now);
    }

    /// Moves forward by `ms`
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Wall-clock milliseconds since the Unix epoch
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};

        // A clock set before 1970 reads as zero
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        // Round to the nearest millisecond
        let round_up = since_epoch.subsec_nanos() % 1_000_000 >= 500_000;
        let millis = since_epoch.as_millis() + u128::from(round_up);
        u64::try_from(millis).unwrap_or(u64::MAX)
    }
}
