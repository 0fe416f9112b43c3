// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quality feedback between the renderer and its frame supplier.
//!
//! Every scheduling decision produces one [`QualityMessage`] describing how
//! far behind (or ahead of) schedule presentation is running. The message is
//! handed to a [`QualitySink`]; a sink that reports success is taken to mean
//! the supplier is compensating on its own, which relaxes local dropping.
//!
//! The reverse direction is an acknowledgement carrying only a proportion,
//! which [`throttle_for_proportion`] turns into an extra delay after each
//! paint.

use core::fmt;

use crate::time::{MILLISECOND, StreamTime, Ticks};

/// Proportion meaning "on pace".
pub const PROPORTION_NORMAL: u16 = 1000;

/// Smallest proportion ever sent upstream (half rate).
pub const PROPORTION_MIN: u16 = 500;

/// Largest proportion ever sent upstream (double rate).
pub const PROPORTION_MAX: u16 = 2000;

/// How far ahead presentation must be, both in lateness and in the wait
/// average, before the supplier is asked to speed up.
pub const AHEAD_MARGIN: Ticks = 2 * MILLISECOND;

/// Where the bottleneck appears to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QualityKind {
    /// Frames are not arriving fast enough; painting is cheap.
    Famine,
    /// Painting dominates the frame interval.
    Flood,
}

/// An outbound quality report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualityMessage {
    /// Bottleneck classification.
    pub kind: QualityKind,
    /// Requested rate relative to nominal, in thousandths (1000 = on pace).
    pub proportion: u16,
    /// Lateness plus half the render average: the expected lateness of the
    /// middle of the paint.
    pub late: Ticks,
    /// Stream time at which the report was made.
    pub timestamp: StreamTime,
}

impl QualityMessage {
    /// Builds the report for a frame that is `late` ticks behind schedule.
    ///
    /// `frame_avg` below zero means no frame interval has been observed yet;
    /// the report is then the uninformative default (Famine, on pace).
    #[must_use]
    pub fn assess(
        late: Ticks,
        timestamp: StreamTime,
        frame_avg: Ticks,
        render_avg: Ticks,
        wait_avg: Ticks,
    ) -> Self {
        let mut proportion = i64::from(PROPORTION_NORMAL);
        let kind;

        if frame_avg < 0 {
            kind = QualityKind::Famine;
        } else {
            kind = if frame_avg > render_avg.saturating_mul(2) {
                QualityKind::Famine
            } else {
                QualityKind::Flood
            };

            if late > 0 {
                proportion = (proportion - late / MILLISECOND).max(i64::from(PROPORTION_MIN));
            } else if wait_avg > AHEAD_MARGIN && late < -AHEAD_MARGIN {
                proportion = speed_up(frame_avg, wait_avg);
            }
        }

        let proportion = proportion.clamp(i64::from(PROPORTION_MIN), i64::from(PROPORTION_MAX));
        Self {
            kind,
            proportion: u16::try_from(proportion).unwrap_or(PROPORTION_NORMAL),
            late: late.saturating_add(render_avg / 2),
            timestamp,
        }
    }
}

/// Ratio `frame_avg / (frame_avg + margin - wait_avg)` in thousandths,
/// capped at [`PROPORTION_MAX`].
fn speed_up(frame_avg: Ticks, wait_avg: Ticks) -> i64 {
    let max = i64::from(PROPORTION_MAX);
    if wait_avg >= frame_avg {
        return max;
    }
    let denom = i128::from(frame_avg) + i128::from(AHEAD_MARGIN) - i128::from(wait_avg);
    if denom <= 0 {
        return max;
    }
    i64::try_from(1000 * i128::from(frame_avg) / denom).map_or(max, |p| p.min(max))
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Why a quality report was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendError {
    /// No supplier is listening.
    Disconnected,
    /// The supplier received the report but will not act on it.
    Rejected,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("no quality sink is connected"),
            Self::Rejected => f.write_str("the quality sink rejected the report"),
        }
    }
}

impl core::error::Error for SendError {}

/// Receives outbound quality reports.
///
/// Returning `Ok` tells the scheduler the supplier is handling quality itself.
pub trait QualitySink {
    /// Delivers one report.
    fn send(&mut self, message: &QualityMessage) -> Result<(), SendError>;
}

impl<S: QualitySink + ?Sized> QualitySink for &mut S {
    fn send(&mut self, message: &QualityMessage) -> Result<(), SendError> {
        (**self).send(message)
    }
}

/// A sink with nobody behind it; every send fails with
/// [`SendError::Disconnected`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Disconnected;

impl QualitySink for Disconnected {
    fn send(&mut self, message: &QualityMessage) -> Result<(), SendError> {
        _ = message;
        Err(SendError::Disconnected)
    }
}

// ---------------------------------------------------------------------------
// Inbound acknowledgement
// ---------------------------------------------------------------------------

/// Converts an acknowledged proportion into a post-paint delay.
///
/// Proportions at or above [`PROPORTION_NORMAL`] need no delay. Below that the
/// delay follows `388_880_000 / (p + 167) - 330_000` ticks, which reaches about
/// 200 ms at `p = 0`. The curve is an empirically fitted heuristic carried
/// over numerically; it is not derived from any control law.
#[must_use]
pub const fn throttle_for_proportion(proportion: u16) -> Ticks {
    if proportion >= PROPORTION_NORMAL {
        return 0;
    }
    let p = proportion as i64;
    let delay = 388_880_000 / (p + 167) - 330_000;
    if delay < 0 { 0 } else { delay }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::millis;

    #[test]
    fn unset_frame_average_is_uninformative() {
        let msg = QualityMessage::assess(millis(30), StreamTime::ZERO, -1, 0, 0);
        assert_eq!(msg.kind, QualityKind::Famine);
        assert_eq!(msg.proportion, PROPORTION_NORMAL);
    }

    #[test]
    fn late_frames_lower_the_proportion() {
        let msg = QualityMessage::assess(millis(30), StreamTime::ZERO, millis(33), 0, 0);
        assert_eq!(msg.proportion, 970);
        let msg = QualityMessage::assess(millis(700), StreamTime::ZERO, millis(33), 0, 0);
        assert_eq!(msg.proportion, PROPORTION_MIN, "never below half rate");
    }

    #[test]
    fn late_includes_half_the_render_average() {
        let msg = QualityMessage::assess(millis(4), StreamTime(77), millis(33), millis(10), 0);
        assert_eq!(msg.late, millis(9));
        assert_eq!(msg.timestamp, StreamTime(77));
    }

    #[test]
    fn kind_follows_render_share() {
        let cheap = QualityMessage::assess(0, StreamTime::ZERO, millis(33), millis(5), 0);
        assert_eq!(cheap.kind, QualityKind::Famine);
        let heavy = QualityMessage::assess(0, StreamTime::ZERO, millis(33), millis(20), 0);
        assert_eq!(heavy.kind, QualityKind::Flood);
    }

    #[test]
    fn comfortably_ahead_asks_for_more() {
        // 1000 * 40 / (40 + 2 - 10) = 1250.
        let msg = QualityMessage::assess(millis(-10), StreamTime::ZERO, millis(40), 0, millis(10));
        assert_eq!(msg.proportion, 1250);

        let msg = QualityMessage::assess(millis(-10), StreamTime::ZERO, millis(40), 0, millis(41));
        assert_eq!(msg.proportion, PROPORTION_MAX, "wait above frame time caps");
    }

    #[test]
    fn slightly_ahead_stays_on_pace() {
        let msg = QualityMessage::assess(millis(-1), StreamTime::ZERO, millis(40), 0, millis(10));
        assert_eq!(msg.proportion, PROPORTION_NORMAL);
    }

    #[test]
    fn throttle_curve() {
        assert_eq!(throttle_for_proportion(1000), 0);
        assert_eq!(throttle_for_proportion(2000), 0);
        assert_eq!(throttle_for_proportion(0), 388_880_000 / 167 - 330_000);
        assert!(throttle_for_proportion(0) <= millis(200), "bounded by ~200 ms");
        assert!(
            throttle_for_proportion(500) < throttle_for_proportion(250),
            "lower proportions throttle harder"
        );
        assert!(
            throttle_for_proportion(999) < MILLISECOND,
            "curve nearly meets zero just below on-pace"
        );
    }

    #[test]
    fn disconnected_sink_fails() {
        let msg = QualityMessage::assess(0, StreamTime::ZERO, -1, 0, 0);
        assert_eq!(Disconnected.send(&msg), Err(SendError::Disconnected));
    }
}
