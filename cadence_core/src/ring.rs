// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-capacity circular buffer of timestamps.
//!
//! [`RingBuffer`] keeps the last `N` pushed values in place and never
//! allocates. For [`StreamTime`] contents it answers rolling
//! "average interval" queries: once more than `N - 1` values have been
//! pushed, the average spans exactly `N - 1` intervals (oldest slot to newest
//! slot); before that it spans everything pushed so far.

use crate::time::{StreamTime, Ticks};

/// A const-capacity circular buffer.
///
/// `count` keeps growing past `N` so callers can tell a warm buffer from a
/// cold one; only the last `N` values are retained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingBuffer<T, const N: usize> {
    slots: [T; N],
    count: u64,
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    /// Creates an empty buffer.
    ///
    /// # Panics
    ///
    /// Panics if `N` is less than 2, since no interval can be formed.
    #[must_use]
    pub fn new() -> Self {
        assert!(N >= 2, "ring buffer needs room for at least one interval");
        Self {
            slots: [T::default(); N],
            count: 0,
        }
    }

    /// Appends a value, overwriting the oldest once full.
    pub fn push(&mut self, value: T) {
        let idx = self.slot(self.count);
        self.slots[idx] = value;
        self.count += 1;
    }

    /// Total number of values pushed since creation or the last reset.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Number of values currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::try_from(self.count).map_or(N, |c| c.min(N))
    }

    /// Returns `true` if nothing has been pushed.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The most recently pushed value.
    #[must_use]
    pub fn newest(&self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        Some(self.slots[self.slot(self.count - 1)])
    }

    /// The oldest retained value.
    #[must_use]
    pub fn oldest(&self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let len = self.len() as u64;
        Some(self.slots[self.slot(self.count - len)])
    }

    /// Iterates retained values oldest→newest.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let len = self.len() as u64;
        let first = self.count - len;
        (first..self.count).map(move |i| self.slots[self.slot(i)])
    }

    /// Empties the buffer.
    pub fn reset(&mut self) {
        self.slots = [T::default(); N];
        self.count = 0;
    }

    #[inline]
    fn slot(&self, position: u64) -> usize {
        // `N` fits in u64 on every supported target, and the remainder is < N.
        usize::try_from(position % N as u64).unwrap_or(0)
    }
}

impl<const N: usize> RingBuffer<StreamTime, N> {
    /// Average interval between consecutive timestamps.
    ///
    /// Returns `None` until two timestamps have been pushed.
    #[must_use]
    pub fn average_interval(&self) -> Option<Ticks> {
        let intervals = self.len().checked_sub(1).filter(|&n| n > 0)?;
        let span = self.newest()?.since(self.oldest()?);
        Some(span / Ticks::try_from(intervals).ok()?)
    }

    /// Events per second in hundredths, derived from
    /// [`average_interval`](Self::average_interval). Zero when unknown.
    #[must_use]
    pub fn rate_hundredths(&self) -> u32 {
        match self.average_interval() {
            Some(interval) if interval > 0 => {
                u32::try_from(100 * crate::time::SECOND / interval).unwrap_or(u32::MAX)
            }
            _ => 0,
        }
    }
}
