// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reusable playback-smoothness metrics, grading, and stream simulation.
//!
//! [`SyncTracker`] grades a presentation run from per-frame sync offsets and
//! drop counts. [`sim::Simulator`] produces such runs deterministically by
//! driving any [`FrameScheduler`](cadence_core::scheduler::FrameScheduler)
//! with a synthetic stream.

#![no_std]

extern crate alloc;

pub mod sim;

use alloc::string::String;

use cadence_core::time::{MILLISECOND, StreamTime};

use crate::sim::FrameRecord;

/// Per-frame metrics sample fed into [`SyncTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct SyncSample {
    /// The supplier is acting on quality reports.
    pub supplier_handling: bool,
    /// Signed offset between paint and nominal start, in ms. `None` for a
    /// dropped frame.
    pub sync_offset_ms: Option<f64>,
    /// Time since the previous paint, in ms. `None` for a dropped frame or
    /// the first paint.
    pub frame_delta_ms: Option<f64>,
}

/// Letter grade for presentation smoothness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyncGrade {
    /// Tight sync and almost no drops.
    A,
    /// Good sync with occasional drops.
    B,
    /// Degraded but watchable.
    C,
    /// Poor sync.
    D,
}

impl SyncGrade {
    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// Aggregated report returned by [`SyncTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct SyncReport {
    /// Current grade.
    pub grade: SyncGrade,
    /// Drops per 1000 observed frames.
    pub drop_rate_per_1000: f64,
    /// Most recent signed sync offset in milliseconds.
    pub sync_offset_ms: f64,
    /// Total frames observed.
    pub total_frames: u64,
    /// Total drops observed.
    pub dropped_frames: u64,
}

/// Rolling sync tracker with fixed-size frame-delta history.
#[derive(Debug)]
pub struct SyncTracker<const N: usize> {
    deltas_ms: [f64; N],
    cursor: usize,
    total_frames: u64,
    dropped_frames: u64,
    last_offset_ms: f64,
    last_presented: Option<StreamTime>,
}

impl<const N: usize> Default for SyncTracker<N> {
    fn default() -> Self {
        Self::new(33.33)
    }
}

impl<const N: usize> SyncTracker<N> {
    /// Creates a tracker with `seed_delta_ms` prefilled in the ring buffer.
    #[must_use]
    pub const fn new(seed_delta_ms: f64) -> Self {
        Self {
            deltas_ms: [seed_delta_ms; N],
            cursor: 0,
            total_frames: 0,
            dropped_frames: 0,
            last_offset_ms: 0.0,
            last_presented: None,
        }
    }

    /// Observes one frame and returns an updated report.
    ///
    /// A dropped frame keeps the previous sync offset for grading.
    #[must_use]
    pub fn observe(&mut self, sample: SyncSample) -> SyncReport {
        self.total_frames = self.total_frames.saturating_add(1);
        if let Some(delta) = sample.frame_delta_ms {
            self.deltas_ms[self.cursor % N] = delta;
            self.cursor = (self.cursor + 1) % N;
        }

        match sample.sync_offset_ms {
            Some(offset) => self.last_offset_ms = offset,
            None => self.dropped_frames = self.dropped_frames.saturating_add(1),
        }

        let drop_rate = self.dropped_frames as f64 * 1000.0 / self.total_frames as f64;
        let grade = grade_for(sample.supplier_handling, self.last_offset_ms.abs(), drop_rate);

        SyncReport {
            grade,
            drop_rate_per_1000: drop_rate,
            sync_offset_ms: self.last_offset_ms,
            total_frames: self.total_frames,
            dropped_frames: self.dropped_frames,
        }
    }

    /// Observes a simulated frame.
    #[must_use]
    pub fn observe_record(&mut self, record: &FrameRecord) -> SyncReport {
        let frame_delta_ms = match (record.presented, self.last_presented) {
            (Some(now), Some(prev)) => Some(ticks_to_ms(now.since(prev))),
            _ => None,
        };
        if record.presented.is_some() {
            self.last_presented = record.presented;
        }
        self.observe(SyncSample {
            supplier_handling: record.supplier_handling,
            sync_offset_ms: record.sync_offset().map(ticks_to_ms),
            frame_delta_ms,
        })
    }

    /// Returns ring-buffer frame deltas oldest→newest.
    #[must_use]
    pub fn frame_deltas(&self) -> [f64; N] {
        let mut out = [0.0; N];
        let mut i = 0;
        while i < N {
            let idx = (self.cursor + i) % N;
            out[i] = self.deltas_ms[idx];
            i += 1;
        }
        out
    }

    /// Returns an ASCII sparkline over `frame_deltas()`.
    #[must_use]
    pub fn sparkline_ascii(&self, min_ms: f64, max_ms: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        let mut out = String::with_capacity(N);
        for v in self.frame_deltas() {
            let v = v.clamp(min_ms, max_ms);
            let t = (v - min_ms) / (max_ms - min_ms);
            #[expect(
                clippy::cast_possible_truncation,
                reason = "index is clamped to ASCII level count"
            )]
            let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
            out.push(LEVELS[level] as char);
        }
        out
    }
}

fn ticks_to_ms(ticks: i64) -> f64 {
    ticks as f64 / MILLISECOND as f64
}

fn grade_for(supplier_handling: bool, offset_abs_ms: f64, drop_rate_per_1000: f64) -> SyncGrade {
    // A supplier acting on quality reports should leave little for the
    // renderer to drop.
    let (a_offset, b_offset, c_offset, a_drop, b_drop, c_drop) = if supplier_handling {
        (10.0, 20.0, 40.0, 5.0, 20.0, 50.0)
    } else {
        (15.0, 30.0, 60.0, 10.0, 40.0, 100.0)
    };

    if offset_abs_ms < a_offset && drop_rate_per_1000 < a_drop {
        SyncGrade::A
    } else if offset_abs_ms < b_offset && drop_rate_per_1000 < b_drop {
        SyncGrade::B
    } else if offset_abs_ms < c_offset && drop_rate_per_1000 < c_drop {
        SyncGrade::C
    } else {
        SyncGrade::D
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawn(offset_ms: f64) -> SyncSample {
        SyncSample {
            supplier_handling: false,
            sync_offset_ms: Some(offset_ms),
            frame_delta_ms: Some(33.3),
        }
    }

    #[test]
    fn drop_rate_accumulates() {
        let mut t = SyncTracker::<8>::default();
        let mut last = None;
        for i in 0..10 {
            let sample = if (1..3).contains(&i) {
                SyncSample {
                    sync_offset_ms: None,
                    frame_delta_ms: None,
                    ..drawn(0.0)
                }
            } else {
                drawn(4.0)
            };
            last = Some(t.observe(sample));
        }
        let report = last.unwrap();
        assert!((report.drop_rate_per_1000 - 200.0).abs() < 1e-6);
        assert_eq!(report.dropped_frames, 2);
        assert_eq!(report.grade, SyncGrade::D);
    }

    #[test]
    fn dropped_frame_keeps_previous_offset() {
        let mut t = SyncTracker::<4>::default();
        _ = t.observe(drawn(-7.5));
        let r = t.observe(SyncSample {
            sync_offset_ms: None,
            frame_delta_ms: None,
            ..drawn(0.0)
        });
        assert!((r.sync_offset_ms + 7.5).abs() < 1e-9);
    }

    #[test]
    fn supplier_handling_thresholds_are_stricter() {
        let mut t = SyncTracker::<4>::default();
        let handled = t.observe(SyncSample {
            supplier_handling: true,
            ..drawn(25.0)
        });
        assert_eq!(handled.grade, SyncGrade::C);

        let local = t.observe(drawn(25.0));
        assert_eq!(local.grade, SyncGrade::B);
    }

    #[test]
    fn sparkline_follows_deltas() {
        let mut t = SyncTracker::<4>::new(0.0);
        for delta in [10.0, 20.0, 30.0, 40.0] {
            _ = t.observe(SyncSample {
                frame_delta_ms: Some(delta),
                ..drawn(0.0)
            });
        }
        assert_eq!(t.sparkline_ascii(10.0, 40.0), " -*@");
    }
}
