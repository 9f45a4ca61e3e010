// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time in microsecond ticks.
//!
//! [`HostTime`] is a point on the host's monotonic clock (for browsers,
//! `performance.now()` scaled to microseconds). [`Duration`] is a span in the
//! same units. The core never reads a clock itself; hosts pass `now` (or a
//! [`Clock`]) into every time-sensitive call, which keeps scheduling
//! deterministic under test.

use core::fmt;
use core::ops::{Add, Sub};

/// Number of ticks in one millisecond.
pub const TICKS_PER_MILLI: u64 = 1_000;

/// A point in time expressed as microseconds on the host's monotonic clock.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Creates a host time from a millisecond timestamp.
    #[inline]
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms.saturating_mul(TICKS_PER_MILLI))
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Checked addition of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, duration: Duration) -> Option<Self> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }

    /// Saturating addition of a duration.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Duration) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// A duration in microsecond ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Creates a duration from whole milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms.saturating_mul(TICKS_PER_MILLI))
    }

    /// Returns the duration in fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / TICKS_PER_MILLI as f64
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

/// A source of host time.
///
/// Engine calls that span several phases take a clock instead of a single
/// `now`, so each phase boundary can be timestamped. Any
/// `FnMut() -> HostTime` closure is a clock, which keeps tests
/// deterministic.
pub trait Clock {
    /// Returns the current host time.
    fn now(&mut self) -> HostTime;
}

impl<F> Clock for F
where
    F: FnMut() -> HostTime,
{
    #[inline]
    fn now(&mut self) -> HostTime {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_conversion() {
        assert_eq!(Duration::from_millis(3).ticks(), 3_000);
        assert_eq!(HostTime::from_millis(2), HostTime(2_000));
        assert!((Duration(1_500).as_millis_f64() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn duration_arithmetic() {
        let a = Duration(100);
        let b = Duration(30);
        assert_eq!((a + b).ticks(), 130);
        assert_eq!((a - b).ticks(), 70);
        assert_eq!(a.saturating_sub(Duration(200)), Duration::ZERO);
    }

    #[test]
    fn host_time_duration_ops() {
        let t = HostTime(1000);
        let d = Duration(200);
        assert_eq!((t + d).ticks(), 1200);
        assert_eq!((t - d).ticks(), 800);
        assert_eq!(t.saturating_duration_since(HostTime(1500)), Duration::ZERO);
        assert_eq!(t.saturating_duration_since(HostTime(400)), Duration(600));
        assert_eq!(HostTime(u64::MAX).checked_add(Duration(1)), None);
    }

    #[test]
    fn closures_are_clocks() {
        let mut t = 0;
        let mut clock = || {
            t += 250;
            HostTime(t)
        };
        assert_eq!(Clock::now(&mut clock), HostTime(250));
        assert_eq!(Clock::now(&mut clock), HostTime(500));
    }
}
