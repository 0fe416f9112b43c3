// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stream clock sources.
//!
//! The renderer reads the stream time once per scheduling decision through
//! the [`StreamClock`] trait. [`MonotonicClock`] anchors `std::time::Instant`
//! at stream start; [`ManualClock`] is a shared, explicitly driven clock for
//! simulation and tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Instant;

use cadence_core::time::{StreamTime, Ticks, from_duration};
use parking_lot::Mutex;

/// A monotonic source of stream time.
pub trait StreamClock: Send + Sync {
    /// Current stream time, or `None` if the clock is not running.
    fn stream_time(&self) -> Option<StreamTime>;
}

impl<C: StreamClock + ?Sized> StreamClock for Arc<C> {
    fn stream_time(&self) -> Option<StreamTime> {
        (**self).stream_time()
    }
}

/// Wall-clock stream time anchored at the last [`restart`](Self::restart).
#[derive(Debug)]
pub struct MonotonicClock {
    anchor: Mutex<Option<Instant>>,
}

impl MonotonicClock {
    /// Creates a clock whose stream time starts at zero now.
    #[must_use]
    pub fn started() -> Self {
        Self {
            anchor: Mutex::new(Some(Instant::now())),
        }
    }

    /// Creates a clock that reports no time until [`restart`](Self::restart).
    #[must_use]
    pub fn stopped() -> Self {
        Self {
            anchor: Mutex::new(None),
        }
    }

    /// Re-anchors stream time zero at the current instant.
    pub fn restart(&self) {
        *self.anchor.lock() = Some(Instant::now());
    }

    /// Stops the clock; it reports no time until restarted.
    pub fn stop(&self) {
        *self.anchor.lock() = None;
    }
}

impl StreamClock for MonotonicClock {
    fn stream_time(&self) -> Option<StreamTime> {
        let anchor = (*self.anchor.lock())?;
        Some(StreamTime(from_duration(anchor.elapsed())))
    }
}

#[derive(Debug)]
struct ManualShared {
    ticks: AtomicI64,
    running: AtomicBool,
}

/// An explicitly driven clock. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    shared: Arc<ManualShared>,
}

impl ManualClock {
    /// Creates a running clock at `at`.
    #[must_use]
    pub fn new(at: StreamTime) -> Self {
        Self {
            shared: Arc::new(ManualShared {
                ticks: AtomicI64::new(at.ticks()),
                running: AtomicBool::new(true),
            }),
        }
    }

    /// Current time, whether or not the clock is running.
    #[must_use]
    pub fn now(&self) -> StreamTime {
        StreamTime(self.shared.ticks.load(Ordering::Acquire))
    }

    /// Jumps to `at`.
    pub fn set(&self, at: StreamTime) {
        self.shared.ticks.store(at.ticks(), Ordering::Release);
    }

    /// Moves the clock forward by `span` and returns the new time.
    pub fn advance(&self, span: Ticks) -> StreamTime {
        let prev = self.shared.ticks.fetch_add(span, Ordering::AcqRel);
        StreamTime(prev).saturating_add(span)
    }

    /// Makes the clock report no time.
    pub fn pause(&self) {
        self.shared.running.store(false, Ordering::Release);
    }

    /// Makes the clock report time again.
    pub fn resume(&self) {
        self.shared.running.store(true, Ordering::Release);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(StreamTime::ZERO)
    }
}

impl StreamClock for ManualClock {
    fn stream_time(&self) -> Option<StreamTime> {
        self.shared
            .running
            .load(Ordering::Acquire)
            .then(|| self.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::time::millis;

    #[test]
    fn monotonic_clock_does_not_go_backwards() {
        let clock = MonotonicClock::started();
        let first = clock.stream_time().unwrap();
        let second = clock.stream_time().unwrap();
        assert!(second >= first, "monotonic clock should not go backwards");
        assert!(first >= StreamTime::ZERO, "starts at zero");
    }

    #[test]
    fn stopped_clock_reports_nothing() {
        let clock = MonotonicClock::stopped();
        assert_eq!(clock.stream_time(), None);
        clock.restart();
        assert!(clock.stream_time().is_some());
        clock.stop();
        assert_eq!(clock.stream_time(), None);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::default();
        let other = clock.clone();
        assert_eq!(clock.advance(millis(33)), StreamTime::from_millis(33));
        assert_eq!(other.stream_time(), Some(StreamTime::from_millis(33)));
        other.set(StreamTime::from_millis(500));
        assert_eq!(clock.now(), StreamTime::from_millis(500));
    }

    #[test]
    fn paused_manual_clock_is_unavailable() {
        let clock = ManualClock::new(StreamTime::from_millis(10));
        clock.pause();
        assert_eq!(clock.stream_time(), None);
        clock.resume();
        assert_eq!(clock.stream_time(), Some(StreamTime::from_millis(10)));
    }

    #[test]
    fn shared_clock_through_arc() {
        let clock: Arc<dyn StreamClock> = Arc::new(ManualClock::new(StreamTime(7)));
        assert_eq!(clock.stream_time(), Some(StreamTime(7)));
    }
}
