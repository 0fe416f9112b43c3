// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use cadence_core::quality::{QualityKind, QualityMessage};
use cadence_core::scheduler::Decision;
use cadence_core::time::StreamTime;
use cadence_core::trace::{
    DecisionEvent, NotifyEvent, QualityEvent, RenderEvent, RenderKind, ResetEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_DECISION: u8 = 1;
const TAG_QUALITY: u8 = 2;
const TAG_RENDER: u8 = 3;
const TAG_NOTIFY: u8 = 4;
const TAG_RESET: u8 = 5;

const DECISION_DRAW_NOW: u8 = 0;
const DECISION_DRAW_AT: u8 = 1;
const DECISION_DROP: u8 = 2;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
    events: usize,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of events recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events == 0
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8) {
        self.events += 1;
        self.write_u8(tag);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_decision(&mut self, d: Decision) {
        match d {
            Decision::DrawNow => {
                self.write_u8(DECISION_DRAW_NOW);
                self.write_i64(0);
            }
            Decision::DrawAt(at) => {
                self.write_u8(DECISION_DRAW_AT);
                self.write_i64(at.ticks());
            }
            Decision::Drop => {
                self.write_u8(DECISION_DROP);
                self.write_i64(0);
            }
        }
    }

    fn write_quality(&mut self, m: &QualityMessage) {
        self.write_u8(match m.kind {
            QualityKind::Famine => 0,
            QualityKind::Flood => 1,
        });
        self.write_u16(m.proportion);
        self.write_i64(m.late);
        self.write_i64(m.timestamp.ticks());
    }
}

impl TraceSink for RecorderSink {
    fn on_decision(&mut self, e: &DecisionEvent) {
        self.begin(TAG_DECISION);
        self.write_u64(e.sequence);
        self.write_i64(e.sample_start.ticks());
        self.write_i64(e.sample_end.ticks());
        self.write_i64(e.now.ticks());
        self.write_decision(e.decision);
        self.write_i64(e.late);
        self.write_i64(e.earliness);
        self.write_i64(e.wait_avg);
        self.write_i64(e.frame_avg);
        self.write_i64(e.render_avg);
        self.write_i32(e.normal_run);
    }

    fn on_quality(&mut self, e: &QualityEvent) {
        self.begin(TAG_QUALITY);
        self.write_u64(e.sequence);
        self.write_quality(&e.message);
        self.write_u8(u8::from(e.delivered));
    }

    fn on_render(&mut self, e: &RenderEvent) {
        self.begin(TAG_RENDER);
        self.write_u8(match e.kind {
            RenderKind::Blitted => 0,
            RenderKind::DirectSurface => 1,
        });
        self.write_i64(e.start);
        self.write_i64(e.end);
        self.write_u8(u8::from(e.accepted));
        self.write_i64(e.render_avg);
        self.write_i64(e.throttle);
    }

    fn on_notify(&mut self, e: &NotifyEvent) {
        self.begin(TAG_NOTIFY);
        self.write_u16(e.proportion);
        self.write_i64(e.throttle);
    }

    fn on_reset(&mut self, e: &ResetEvent) {
        self.begin(TAG_RESET);
        self.write_u32(e.frames_drawn);
        self.write_u32(e.frames_dropped);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`DecisionEvent`].
    Decision(DecisionEvent),
    /// A [`QualityEvent`].
    Quality(QualityEvent),
    /// A [`RenderEvent`].
    Render(RenderEvent),
    /// A [`NotifyEvent`].
    Notify(NotifyEvent),
    /// A [`ResetEvent`].
    Reset(ResetEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u16(&mut self) -> Option<u16> {
        self.take().map(u16::from_le_bytes)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_i64(&mut self) -> Option<i64> {
        self.take().map(i64::from_le_bytes)
    }

    fn read_time(&mut self) -> Option<StreamTime> {
        self.read_i64().map(StreamTime)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|b| b != 0)
    }

    fn read_decision(&mut self) -> Option<Decision> {
        let tag = self.read_u8()?;
        let at = self.read_time()?;
        match tag {
            DECISION_DRAW_NOW => Some(Decision::DrawNow),
            DECISION_DRAW_AT => Some(Decision::DrawAt(at)),
            DECISION_DROP => Some(Decision::Drop),
            _ => None,
        }
    }

    fn read_quality(&mut self) -> Option<QualityMessage> {
        Some(QualityMessage {
            kind: match self.read_u8()? {
                0 => QualityKind::Famine,
                _ => QualityKind::Flood,
            },
            proportion: self.read_u16()?,
            late: self.read_i64()?,
            timestamp: self.read_time()?,
        })
    }

    fn decode_decision(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Decision(DecisionEvent {
            sequence: self.read_u64()?,
            sample_start: self.read_time()?,
            sample_end: self.read_time()?,
            now: self.read_time()?,
            decision: self.read_decision()?,
            late: self.read_i64()?,
            earliness: self.read_i64()?,
            wait_avg: self.read_i64()?,
            frame_avg: self.read_i64()?,
            render_avg: self.read_i64()?,
            normal_run: self.read_i32()?,
        }))
    }

    fn decode_quality(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Quality(QualityEvent {
            sequence: self.read_u64()?,
            message: self.read_quality()?,
            delivered: self.read_bool()?,
        }))
    }

    fn decode_render(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Render(RenderEvent {
            kind: match self.read_u8()? {
                0 => RenderKind::Blitted,
                _ => RenderKind::DirectSurface,
            },
            start: self.read_i64()?,
            end: self.read_i64()?,
            accepted: self.read_bool()?,
            render_avg: self.read_i64()?,
            throttle: self.read_i64()?,
        }))
    }

    fn decode_notify(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Notify(NotifyEvent {
            proportion: self.read_u16()?,
            throttle: self.read_i64()?,
        }))
    }

    fn decode_reset(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Reset(ResetEvent {
            frames_drawn: self.read_u32()?,
            frames_dropped: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_DECISION => self.decode_decision(),
            TAG_QUALITY => self.decode_quality(),
            TAG_RENDER => self.decode_render(),
            TAG_NOTIFY => self.decode_notify(),
            TAG_RESET => self.decode_reset(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
