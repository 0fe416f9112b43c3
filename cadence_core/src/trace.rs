// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the presentation loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! renderer calls after each scheduling decision, quality report, paint
//! measurement, acknowledgement, and reset. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps a `&mut dyn TraceSink`. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method dispatches straight to the sink.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies.

use crate::quality::QualityMessage;
use crate::scheduler::{Decision, RenderOutcome, RenderPath, Sample, SchedulerState};
use crate::time::{StreamTime, Ticks};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which paint path a [`RenderEvent`] measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderKind {
    /// See [`RenderPath::Blitted`].
    Blitted,
    /// See [`RenderPath::DirectSurface`].
    DirectSurface,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after the scheduler decides what to do with a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecisionEvent {
    /// Decision counter since the last reset (first decision is 1).
    pub sequence: u64,
    /// Nominal start of the sample.
    pub sample_start: StreamTime,
    /// Nominal end of the sample.
    pub sample_end: StreamTime,
    /// Stream time of the decision.
    pub now: StreamTime,
    /// The decision itself.
    pub decision: Decision,
    /// Clamped lateness.
    pub late: Ticks,
    /// Earliness after the update.
    pub earliness: Ticks,
    /// Wait average after the update.
    pub wait_avg: Ticks,
    /// Frame interval average after the update.
    pub frame_avg: Ticks,
    /// Render average at decision time.
    pub render_avg: Ticks,
    /// Normal-run counter after the update.
    pub normal_run: i32,
}

impl DecisionEvent {
    /// Creates a `DecisionEvent` from a decision plus the scheduler state it
    /// left behind.
    #[must_use]
    pub fn new(
        sequence: u64,
        sample: &Sample,
        now: StreamTime,
        decision: Decision,
        state: &SchedulerState,
    ) -> Self {
        Self {
            sequence,
            sample_start: sample.start,
            sample_end: sample.end,
            now,
            decision,
            late: state.late,
            earliness: state.earliness,
            wait_avg: state.wait_avg,
            frame_avg: state.frame_avg,
            render_avg: state.render_avg,
            normal_run: state.normal_run,
        }
    }
}

/// Emitted for every quality report sent upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualityEvent {
    /// Sequence of the decision that produced the report.
    pub sequence: u64,
    /// The report.
    pub message: QualityMessage,
    /// Whether the supplier accepted it.
    pub delivered: bool,
}

/// Emitted after a paint measurement is folded in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderEvent {
    /// Which paint path was measured.
    pub kind: RenderKind,
    /// Wall-clock start of the paint (the report time for direct paints).
    pub start: Ticks,
    /// Wall-clock end of the paint (the report time for direct paints).
    pub end: Ticks,
    /// Whether the measurement moved the render average.
    pub accepted: bool,
    /// Render average after the update.
    pub render_avg: Ticks,
    /// Throttle the caller will sleep.
    pub throttle: Ticks,
}

impl RenderEvent {
    /// Creates a `RenderEvent` from a paint path, its outcome, and the
    /// resulting render average.
    ///
    /// `reported_at` is the wall-clock time of the report. Untimed paths are
    /// recorded as a zero-length span there.
    #[must_use]
    pub fn new(
        path: &RenderPath,
        reported_at: Ticks,
        outcome: &RenderOutcome,
        render_avg: Ticks,
    ) -> Self {
        let (kind, start, end) = match *path {
            RenderPath::Blitted { start, end } => (RenderKind::Blitted, start, end),
            RenderPath::DirectSurface => (RenderKind::DirectSurface, reported_at, reported_at),
        };
        Self {
            kind,
            start,
            end,
            accepted: outcome.accepted,
            render_avg,
            throttle: outcome.throttle,
        }
    }

    /// Measured paint time, never negative.
    #[must_use]
    pub fn elapsed(&self) -> Ticks {
        self.end.saturating_sub(self.start).max(0)
    }
}

/// Emitted when an acknowledgement arrives from the supplier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotifyEvent {
    /// Acknowledged proportion.
    pub proportion: u16,
    /// Resulting throttle.
    pub throttle: Ticks,
}

/// Emitted when the scheduler is reset (stream stop, flush, or start).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetEvent {
    /// Frames drawn before the reset.
    pub frames_drawn: u32,
    /// Frames dropped before the reset.
    pub frames_dropped: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the presentation loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after each scheduling decision.
    fn on_decision(&mut self, e: &DecisionEvent) {
        _ = e;
    }

    /// Called for each quality report.
    fn on_quality(&mut self, e: &QualityEvent) {
        _ = e;
    }

    /// Called after each paint measurement.
    fn on_render(&mut self, e: &RenderEvent) {
        _ = e;
    }

    /// Called when an acknowledgement arrives.
    fn on_notify(&mut self, e: &NotifyEvent) {
        _ = e;
    }

    /// Called when the scheduler is reset.
    fn on_reset(&mut self, e: &ResetEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around a [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: &'a mut dyn TraceSink,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`DecisionEvent`].
    #[inline]
    pub fn decision(&mut self, e: &DecisionEvent) {
        #[cfg(feature = "trace")]
        self.sink.on_decision(e);
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`QualityEvent`].
    #[inline]
    pub fn quality(&mut self, e: &QualityEvent) {
        #[cfg(feature = "trace")]
        self.sink.on_quality(e);
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderEvent`].
    #[inline]
    pub fn render(&mut self, e: &RenderEvent) {
        #[cfg(feature = "trace")]
        self.sink.on_render(e);
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`NotifyEvent`].
    #[inline]
    pub fn notify(&mut self, e: &NotifyEvent) {
        #[cfg(feature = "trace")]
        self.sink.on_notify(e);
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ResetEvent`].
    #[inline]
    pub fn reset(&mut self, e: &ResetEvent) {
        #[cfg(feature = "trace")]
        self.sink.on_reset(e);
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityKind;
    use crate::time::millis;

    fn sample_decision() -> DecisionEvent {
        DecisionEvent {
            sequence: 42,
            sample_start: StreamTime::from_millis(330),
            sample_end: StreamTime::from_millis(363),
            now: StreamTime::from_millis(330),
            decision: Decision::DrawNow,
            late: millis(8),
            earliness: 0,
            wait_avg: 0,
            frame_avg: millis(33),
            render_avg: millis(4),
            normal_run: 10,
        }
    }

    #[test]
    fn decision_event_from_state() {
        let mut state = SchedulerState::initial();
        state.late = millis(-3);
        state.normal_run = 7;
        let sample = Sample::new(StreamTime::from_millis(40), StreamTime::from_millis(80));
        let evt = DecisionEvent::new(
            3,
            &sample,
            StreamTime::from_millis(37),
            Decision::DrawAt(sample.start),
            &state,
        );
        assert_eq!(evt.sequence, 3);
        assert_eq!(evt.late, millis(-3));
        assert_eq!(evt.normal_run, 7);
        assert_eq!(evt.sample_end, StreamTime::from_millis(80));
        assert_eq!(evt.frame_avg, -1);
    }

    #[test]
    fn render_event_from_path() {
        let path = RenderPath::Blitted {
            start: millis(10),
            end: millis(14),
        };
        let outcome = RenderOutcome {
            elapsed: millis(4),
            accepted: true,
            throttle: 0,
        };
        let evt = RenderEvent::new(&path, millis(15), &outcome, millis(1));
        assert_eq!(evt.kind, RenderKind::Blitted);
        assert_eq!(evt.start, millis(10));
        assert_eq!(evt.elapsed(), millis(4));
        assert_eq!(evt.render_avg, millis(1));
    }

    #[test]
    fn direct_render_event_is_a_point() {
        let outcome = RenderOutcome {
            elapsed: 0,
            accepted: false,
            throttle: millis(2),
        };
        let evt = RenderEvent::new(&RenderPath::DirectSurface, millis(30), &outcome, 0);
        assert_eq!(evt.kind, RenderKind::DirectSurface);
        assert_eq!((evt.start, evt.end), (millis(30), millis(30)));
        assert_eq!(evt.elapsed(), 0);
        assert_eq!(evt.throttle, millis(2));
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_decision(&sample_decision());
        sink.on_quality(&QualityEvent {
            sequence: 1,
            message: QualityMessage {
                kind: QualityKind::Famine,
                proportion: 1000,
                late: 0,
                timestamp: StreamTime::ZERO,
            },
            delivered: false,
        });
        sink.on_notify(&NotifyEvent {
            proportion: 800,
            throttle: 0,
        });
        sink.on_reset(&ResetEvent {
            frames_drawn: 0,
            frames_dropped: 0,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            decisions: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_decision(&mut self, e: &DecisionEvent) {
                self.decisions.push(e.sequence);
            }
        }

        let mut sink = RecordingSink {
            decisions: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.decision(&sample_decision());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.decisions, &[42]);
    }
}
