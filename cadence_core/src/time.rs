// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stream time and tick units.
//!
//! All timing in cadence is expressed in [`Ticks`]: signed 100 ns units, the
//! resolution used by media timestamps. Spans (lateness, durations, averages)
//! are plain [`Ticks`] because most of them are signed. Points on the stream
//! axis use the [`StreamTime`] newtype.
//!
//! Conversions to and from [`core::time::Duration`] and all [`StreamTime`]
//! arithmetic saturate instead of panicking: open-ended samples and raw
//! wall-clock measurements feed directly into the engine.

use core::fmt;
use core::ops::{Add, AddAssign, Sub};

/// A signed span of time in 100 ns units.
pub type Ticks = i64;

/// Ticks per millisecond.
pub const MILLISECOND: Ticks = 10_000;

/// Ticks per second.
pub const SECOND: Ticks = 10_000_000;

/// Converts whole milliseconds to ticks.
#[inline]
#[must_use]
pub const fn millis(ms: i64) -> Ticks {
    ms.saturating_mul(MILLISECOND)
}

/// Converts ticks to whole milliseconds, truncating toward zero.
#[inline]
#[must_use]
pub const fn to_millis(ticks: Ticks) -> i64 {
    ticks / MILLISECOND
}

/// Converts a [`core::time::Duration`] to ticks, saturating at [`Ticks::MAX`].
#[inline]
#[must_use]
pub fn from_duration(d: core::time::Duration) -> Ticks {
    Ticks::try_from(d.as_nanos() / 100).unwrap_or(Ticks::MAX)
}

/// Converts ticks to a [`core::time::Duration`]. Negative spans become zero.
#[inline]
#[must_use]
pub fn to_duration(ticks: Ticks) -> core::time::Duration {
    let ticks = u64::try_from(ticks).unwrap_or(0);
    core::time::Duration::from_nanos(ticks.saturating_mul(100))
}

/// A point on the stream time axis, in 100 ns ticks since stream start.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamTime(pub i64);

impl StreamTime {
    /// The stream origin.
    pub const ZERO: Self = Self(0);

    /// A time far enough in the past that anything compared against it looks
    /// stale, while still leaving headroom for subtraction.
    pub const AGES_AGO: Self = Self(i64::MIN / 4);

    /// Creates a stream time from whole milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(ms: i64) -> Self {
        Self(millis(ms))
    }

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> Ticks {
        self.0
    }

    /// Returns the signed span from `earlier` to `self`.
    #[inline]
    #[must_use]
    pub const fn since(self, earlier: Self) -> Ticks {
        self.0.saturating_sub(earlier.0)
    }

    /// Saturating addition of a signed span.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, span: Ticks) -> Self {
        Self(self.0.saturating_add(span))
    }

    /// Saturating subtraction of a signed span.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, span: Ticks) -> Self {
        Self(self.0.saturating_sub(span))
    }
}

impl Add<Ticks> for StreamTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Ticks) -> Self {
        self.saturating_add(rhs)
    }
}

impl AddAssign<Ticks> for StreamTime {
    #[inline]
    fn add_assign(&mut self, rhs: Ticks) {
        *self = self.saturating_add(rhs);
    }
}

impl Sub<Ticks> for StreamTime {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Ticks) -> Self {
        self.saturating_sub(rhs)
    }
}

impl Sub for StreamTime {
    type Output = Ticks;

    #[inline]
    fn sub(self, rhs: Self) -> Ticks {
        self.since(rhs)
    }
}

impl fmt::Debug for StreamTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamTime({})", self.0)
    }
}
