// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Stream and
//! wall-clock spans are printed in milliseconds.

use std::io::Write;

use cadence_core::scheduler::Decision;
use cadence_core::time::{MILLISECOND, Ticks};
use cadence_core::trace::{
    DecisionEvent, NotifyEvent, QualityEvent, RenderEvent, RenderKind, ResetEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: W,
    drops_only: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("drops_only", &self.drops_only)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            drops_only: false,
        }
    }

    /// Suppresses decision lines other than drops.
    #[must_use]
    pub fn drops_only(mut self) -> Self {
        self.drops_only = true;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

/// Formats a span as signed milliseconds with one decimal.
fn ms(ticks: Ticks) -> String {
    let sign = if ticks < 0 { "-" } else { "" };
    let abs = ticks.unsigned_abs();
    let unit = MILLISECOND.unsigned_abs();
    format!("{sign}{}.{}ms", abs / unit, (abs % unit) / (unit / 10))
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_decision(&mut self, e: &DecisionEvent) {
        if self.drops_only && e.decision.is_draw() {
            return;
        }
        let what = match e.decision {
            Decision::DrawNow => "draw".to_owned(),
            Decision::DrawAt(at) => format!("draw@{}", ms(at.ticks())),
            Decision::Drop => "DROP".to_owned(),
        };
        let _ = writeln!(
            self.writer,
            "[decide] #{} start={} now={} {what} late={} early={} wait={} frame={} render={} run={}",
            e.sequence,
            ms(e.sample_start.ticks()),
            ms(e.now.ticks()),
            ms(e.late),
            ms(e.earliness),
            ms(e.wait_avg),
            ms(e.frame_avg),
            ms(e.render_avg),
            e.normal_run,
        );
    }

    fn on_quality(&mut self, e: &QualityEvent) {
        if self.drops_only {
            return;
        }
        let delivered = if e.delivered { "ok" } else { "undelivered" };
        let _ = writeln!(
            self.writer,
            "[quality] #{} {:?} proportion={} late={} {delivered}",
            e.sequence,
            e.message.kind,
            e.message.proportion,
            ms(e.message.late),
        );
    }

    fn on_render(&mut self, e: &RenderEvent) {
        if self.drops_only {
            return;
        }
        let kind = match e.kind {
            RenderKind::Blitted => "blit",
            RenderKind::DirectSurface => "direct",
        };
        let spike = if e.accepted || e.kind == RenderKind::DirectSurface {
            ""
        } else {
            " spike"
        };
        let _ = writeln!(
            self.writer,
            "[render] {kind} took={}{spike} avg={} throttle={}",
            ms(e.elapsed()),
            ms(e.render_avg),
            ms(e.throttle),
        );
    }

    fn on_notify(&mut self, e: &NotifyEvent) {
        let _ = writeln!(
            self.writer,
            "[notify] proportion={} throttle={}",
            e.proportion,
            ms(e.throttle),
        );
    }

    fn on_reset(&mut self, e: &ResetEvent) {
        let _ = writeln!(
            self.writer,
            "[reset] drawn={} dropped={}",
            e.frames_drawn, e.frames_dropped,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::time::{StreamTime, millis};

    fn event(decision: Decision) -> DecisionEvent {
        DecisionEvent {
            sequence: 3,
            sample_start: StreamTime::from_millis(80),
            sample_end: StreamTime::from_millis(120),
            now: StreamTime::from_millis(95),
            decision,
            late: millis(15),
            earliness: -5_000,
            wait_avg: 0,
            frame_avg: millis(40),
            render_avg: millis(12),
            normal_run: -1,
        }
    }

    #[test]
    fn millisecond_formatting() {
        assert_eq!(ms(millis(15)), "15.0ms");
        assert_eq!(ms(-5_000), "-0.5ms");
        assert_eq!(ms(123_456), "12.3ms");
    }

    #[test]
    fn pretty_print_decision() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_decision(&event(Decision::Drop));
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.starts_with("[decide] #3"), "got: {output}");
        assert!(output.contains("DROP"), "got: {output}");
        assert!(output.contains("late=15.0ms"), "got: {output}");
        assert!(output.contains("early=-0.5ms"), "got: {output}");
    }

    #[test]
    fn drops_only_filters_draws() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).drops_only();
        sink.on_decision(&event(Decision::DrawNow));
        sink.on_decision(&event(Decision::Drop));
        sink.on_reset(&ResetEvent {
            frames_drawn: 1,
            frames_dropped: 1,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert_eq!(output.lines().count(), 2, "got: {output}");
        assert!(!output.contains(" draw "), "got: {output}");
    }

    #[test]
    fn direct_paint_is_not_a_spike() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_render(&RenderEvent {
            kind: RenderKind::DirectSurface,
            start: millis(30),
            end: millis(30),
            accepted: false,
            render_avg: 0,
            throttle: 0,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.starts_with("[render] direct took=0.0ms avg"), "got: {output}");
    }
}
