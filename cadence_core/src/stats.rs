// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Playback statistics.
//!
//! Two [`RingBuffer`] specializations track cadence:
//!
//! - [`ArrivalStats`]: when samples reached the scheduler (incoming rate).
//! - [`DrawStats`]: when frames were (or will be) presented, plus the
//!   dropped-frame counter.
//!
//! [`PlaybackStats`] aggregates those with the cumulative sync-offset and
//! inter-frame sums needed for O(1) running standard deviations, and keeps a
//! short [`MovingAverage`] of recent offsets for graphing.

use crate::average::MovingAverage;
use crate::ring::RingBuffer;
use crate::time::{MILLISECOND, StreamTime, Ticks};

/// Capacity of the arrival and draw rings.
pub const RATE_WINDOW: usize = 32;

/// Number of recent sync offsets kept for graphing.
pub const OFFSET_WINDOW: usize = 64;

/// Largest magnitude, in ms, recorded for one sync-offset or inter-frame sample.
const SAMPLE_LIMIT_MS: i64 = 1000;

/// Arrival timestamps of incoming samples.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrivalStats {
    ring: RingBuffer<StreamTime, RATE_WINDOW>,
}

impl ArrivalStats {
    /// Records a sample arriving at `now`.
    pub fn record(&mut self, now: StreamTime) {
        self.ring.push(now);
    }

    /// Samples seen since the last reset.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.ring.count()
    }

    /// Incoming frame rate in hundredths of a frame per second.
    #[must_use]
    pub fn rate_hundredths(&self) -> u32 {
        self.ring.rate_hundredths()
    }
}

/// Presentation timestamps of drawn frames and the dropped-frame counter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    ring: RingBuffer<StreamTime, RATE_WINDOW>,
    dropped: u32,
}

impl DrawStats {
    /// Records a frame presented at `at`.
    pub fn record_draw(&mut self, at: StreamTime) {
        self.ring.push(at);
    }

    /// Records a dropped frame.
    pub fn record_drop(&mut self) {
        self.dropped = self.dropped.saturating_add(1);
    }

    /// Frames drawn since the last reset.
    #[must_use]
    pub fn drawn(&self) -> u32 {
        u32::try_from(self.ring.count()).unwrap_or(u32::MAX)
    }

    /// Frames dropped since the last reset.
    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Presentation rate in hundredths of a frame per second.
    #[must_use]
    pub fn rate_hundredths(&self) -> u32 {
        self.ring.rate_hundredths()
    }
}

/// Summary of the recent sync-offset window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffsetSummary {
    /// Mean offset over the window.
    pub average: Ticks,
    /// Earliest (most negative) offset in the window.
    pub min: Ticks,
    /// Latest (most positive) offset in the window.
    pub max: Ticks,
    /// Most recent offset.
    pub last: Ticks,
}

/// Running accumulator for a mean and standard deviation over whole-ms samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Moments {
    count: i64,
    sum: i64,
    sum_sq: i64,
}

impl Moments {
    fn push(&mut self, ms: i64) {
        self.count = self.count.saturating_add(1);
        self.sum = self.sum.saturating_add(ms);
        self.sum_sq = self.sum_sq.saturating_add(ms.saturating_mul(ms));
    }

    fn mean(self) -> i32 {
        if self.count == 0 {
            return 0;
        }
        saturate_i32(self.sum / self.count)
    }

    fn std_dev(self) -> i32 {
        let n = self.count;
        if n < 2 {
            return 0;
        }
        // Sample variance: (n·Σx² − (Σx)²) / (n·(n − 1)).
        let (n, sum, sum_sq) = (i128::from(n), i128::from(self.sum), i128::from(self.sum_sq));
        let numer = (n * sum_sq - sum * sum).max(0);
        let var = numer / (n * (n - 1));
        saturate_i32(i64::try_from(u128::try_from(var).unwrap_or(0).isqrt()).unwrap_or(i64::MAX))
    }
}

fn saturate_i32(v: i64) -> i32 {
    i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX })
}

/// Cumulative playback statistics since the last reset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackStats {
    arrivals: ArrivalStats,
    draws: DrawStats,
    offsets: Moments,
    frame_times: Moments,
    offset_window: MovingAverage<Ticks, OFFSET_WINDOW>,
}

impl PlaybackStats {
    /// Records a sample reaching the scheduler.
    pub fn record_arrival(&mut self, now: StreamTime) {
        self.arrivals.record(now);
    }

    /// Records a dropped frame.
    pub fn record_drop(&mut self) {
        self.draws.record_drop();
    }

    /// Records a drawn frame.
    ///
    /// `at` is the effective presentation time, `offset` how far that is from
    /// the sample's nominal start, and `frame_time` the gap since the previous
    /// draw. The first drawn frame contributes no offset and the first two no
    /// frame time, since their reference points are unreliable.
    pub fn record_draw(&mut self, at: StreamTime, offset: Ticks, frame_time: Ticks) {
        let drawn_before = self.draws.drawn();
        self.draws.record_draw(at);
        let limit = SAMPLE_LIMIT_MS * MILLISECOND;
        self.offset_window.push(offset.clamp(-limit, limit));

        if drawn_before >= 1 {
            let ms = (offset / MILLISECOND).clamp(-SAMPLE_LIMIT_MS, SAMPLE_LIMIT_MS);
            self.offsets.push(ms);
        }
        if drawn_before >= 2 {
            let mut ms = frame_time / MILLISECOND;
            if !(0..=SAMPLE_LIMIT_MS).contains(&ms) {
                ms = SAMPLE_LIMIT_MS;
            }
            self.frame_times.push(ms);
        }
    }

    /// Frames drawn since the last reset.
    #[must_use]
    pub fn frames_drawn(&self) -> u32 {
        self.draws.drawn()
    }

    /// Frames dropped since the last reset.
    #[must_use]
    pub fn frames_dropped(&self) -> u32 {
        self.draws.dropped()
    }

    /// Average presentation rate in hundredths of a frame per second.
    #[must_use]
    pub fn avg_frame_rate(&self) -> u32 {
        self.draws.rate_hundredths()
    }

    /// Average incoming sample rate in hundredths of a frame per second.
    #[must_use]
    pub fn incoming_frame_rate(&self) -> u32 {
        self.arrivals.rate_hundredths()
    }

    /// Mean sync offset in ms (positive means presented late).
    #[must_use]
    pub fn avg_sync_offset_ms(&self) -> i32 {
        self.offsets.mean()
    }

    /// Standard deviation of the sync offset in ms.
    #[must_use]
    pub fn stddev_sync_offset_ms(&self) -> i32 {
        self.offsets.std_dev()
    }

    /// Standard deviation of the inter-frame time in ms.
    #[must_use]
    pub fn jitter_ms(&self) -> i32 {
        self.frame_times.std_dev()
    }

    /// Summary of the most recent sync offsets, if any frame was drawn.
    #[must_use]
    pub fn recent_sync_offset(&self) -> Option<OffsetSummary> {
        Some(OffsetSummary {
            average: self.offset_window.average()?,
            min: self.offset_window.min()?,
            max: self.offset_window.max()?,
            last: self.offset_window.last()?,
        })
    }

    /// Arrival tracker.
    #[must_use]
    pub fn arrivals(&self) -> &ArrivalStats {
        &self.arrivals
    }

    /// Draw tracker.
    #[must_use]
    pub fn draws(&self) -> &DrawStats {
        &self.draws
    }
}
