// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Windowed and exponential averages.
//!
//! [`MovingAverage`] is a fixed-window accumulator: pushing evicts the oldest
//! sample and keeps the running sum current in O(1). [`Ema`] is the integer
//! exponential moving average the scheduler uses for its timing estimates:
//!
//! ```text
//! avg = (sample + (period - 1) * avg) / period
//! ```

use core::ops::{Add, Sub};

/// Values that can be stored in a [`MovingAverage`].
pub trait WindowSample: Copy + Default + PartialOrd + Add<Output = Self> + Sub<Output = Self> {
    /// Divides `self` by a sample count.
    fn div_count(self, count: usize) -> Self;
}

macro_rules! impl_window_sample_int {
    ($($ty:ty),*) => {$(
        impl WindowSample for $ty {
            #[inline]
            fn div_count(self, count: usize) -> Self {
                match <$ty>::try_from(count) {
                    Ok(0) | Err(_) => <$ty>::default(),
                    Ok(n) => self / n,
                }
            }
        }
    )*};
}

impl_window_sample_int!(i32, i64, u32, u64);

impl WindowSample for f64 {
    #[inline]
    fn div_count(self, count: usize) -> Self {
        if count == 0 { 0.0 } else { self / count as Self }
    }
}

impl WindowSample for f32 {
    #[inline]
    fn div_count(self, count: usize) -> Self {
        if count == 0 { 0.0 } else { self / count as Self }
    }
}

/// A fixed-size window of samples with an O(1) running sum.
#[derive(Clone, Debug, PartialEq)]
pub struct MovingAverage<T, const N: usize> {
    window: [T; N],
    len: usize,
    next: usize,
    sum: T,
    last: Option<T>,
}

impl<T: WindowSample, const N: usize> Default for MovingAverage<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: WindowSample, const N: usize> MovingAverage<T, N> {
    /// Creates an empty window.
    ///
    /// # Panics
    ///
    /// Panics if `N` is zero.
    #[must_use]
    pub fn new() -> Self {
        assert!(N > 0, "moving average window must not be empty");
        Self {
            window: [T::default(); N],
            len: 0,
            next: 0,
            sum: T::default(),
            last: None,
        }
    }

    /// Adds a sample, evicting the oldest once the window is full.
    pub fn push(&mut self, sample: T) {
        if self.len == N {
            self.sum = self.sum - self.window[self.next];
        } else {
            self.len += 1;
        }
        self.window[self.next] = sample;
        self.sum = self.sum + sample;
        self.next = (self.next + 1) % N;
        self.last = Some(sample);
    }

    /// Sum of the samples currently in the window.
    #[inline]
    #[must_use]
    pub fn sum(&self) -> T {
        self.sum
    }

    /// Number of samples currently in the window.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no sample has been pushed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mean of the window, or `None` when empty.
    #[must_use]
    pub fn average(&self) -> Option<T> {
        (self.len > 0).then(|| self.sum.div_count(self.len))
    }

    /// Most recently pushed sample.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.last
    }

    /// Smallest sample in the window.
    #[must_use]
    pub fn min(&self) -> Option<T> {
        self.iter().fold(None, |acc, v| match acc {
            Some(m) if m <= v => Some(m),
            _ => Some(v),
        })
    }

    /// Largest sample in the window.
    #[must_use]
    pub fn max(&self) -> Option<T> {
        self.iter().fold(None, |acc, v| match acc {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
    }

    /// Iterates the window oldest→newest.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let start = (self.next + N - self.len) % N;
        (0..self.len).map(move |i| self.window[(start + i) % N])
    }

    /// Empties the window.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Integer exponential moving average with a fixed period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ema {
    period: i64,
}

impl Ema {
    /// Creates an averager with the given period (clamped to at least 1).
    #[must_use]
    pub const fn new(period: i64) -> Self {
        Self {
            period: if period < 1 { 1 } else { period },
        }
    }

    /// The averaging period.
    #[inline]
    #[must_use]
    pub const fn period(self) -> i64 {
        self.period
    }

    /// Mixes `sample` into `avg` with weight `1 / period`.
    #[inline]
    #[must_use]
    pub const fn mix(self, avg: i64, sample: i64) -> i64 {
        sample.saturating_add(avg.saturating_mul(self.period - 1)) / self.period
    }

    /// Decays `avg` toward zero as if a zero sample had been mixed in.
    #[inline]
    #[must_use]
    pub const fn decay(self, avg: i64) -> i64 {
        avg.saturating_mul(self.period - 1) / self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_tracks_window_contents() {
        let mut avg = MovingAverage::<i64, 3>::new();
        for v in [10, 20, 30, 40] {
            avg.push(v);
        }
        // Window holds 20, 30, 40.
        assert_eq!(avg.sum(), 90);
        assert_eq!(avg.len(), 3);
        assert_eq!(avg.average(), Some(30));
        assert_eq!(avg.last(), Some(40));
        assert_eq!(avg.min(), Some(20));
        assert_eq!(avg.max(), Some(40));
    }

    #[test]
    fn empty_window_has_no_statistics() {
        let avg = MovingAverage::<i32, 4>::new();
        assert!(avg.is_empty());
        assert_eq!(avg.average(), None);
        assert_eq!(avg.min(), None);
        assert_eq!(avg.last(), None);
    }

    #[test]
    fn negative_samples() {
        let mut avg = MovingAverage::<i64, 4>::new();
        for v in [-5, 5, -15] {
            avg.push(v);
        }
        assert_eq!(avg.sum(), -15);
        assert_eq!(avg.average(), Some(-5));
        assert_eq!(avg.min(), Some(-15));
        assert_eq!(avg.max(), Some(5));
    }

    #[test]
    fn float_window() {
        let mut avg = MovingAverage::<f64, 2>::new();
        avg.push(1.0);
        avg.push(2.0);
        avg.push(4.0);
        let mean = avg.average().unwrap();
        assert!((mean - 3.0).abs() < 1e-9, "expected 3.0, got {mean}");
    }

    #[test]
    fn iter_is_oldest_to_newest() {
        let mut avg = MovingAverage::<u32, 3>::new();
        for v in 1..=4 {
            avg.push(v);
        }
        let mut it = avg.iter();
        assert_eq!(it.next(), Some(2));
        assert_eq!(it.next(), Some(3));
        assert_eq!(it.next(), Some(4));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn ema_mixes_with_period_weight() {
        let ema = Ema::new(10);
        assert_eq!(ema.mix(0, 1000), 100);
        assert_eq!(ema.mix(1000, 1000), 1000, "steady input is a fixed point");
        assert_eq!(ema.decay(1000), 900);
    }

    #[test]
    fn ema_period_is_clamped() {
        assert_eq!(Ema::new(0).period(), 1);
        assert_eq!(Ema::new(1).mix(123, 456), 456);
    }
}
