// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Decisions, quality reports and acknowledgements live on the stream-time
//! process ([`STREAM_PID`]); paint spans live on the wall-clock process
//! ([`WALL_PID`]). The two time axes are not aligned.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use cadence_core::scheduler::Decision;
use cadence_core::time::{Ticks, to_millis};

use crate::recorder::{RecordedEvent, decode};

/// Process id of the stream-time track.
pub const STREAM_PID: u32 = 0;

/// Process id of the wall-clock paint track.
pub const WALL_PID: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = vec![
        process_name(STREAM_PID, "stream time"),
        process_name(WALL_PID, "paint (wall clock)"),
    ];
    // Stream time of the latest decision, for events that carry none.
    let mut stream_now: Ticks = 0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Decision(e) => {
                stream_now = e.now.ticks();
                let (name, target) = match e.decision {
                    Decision::DrawNow => ("DrawNow", None),
                    Decision::DrawAt(at) => ("DrawAt", Some(at)),
                    Decision::Drop => ("Drop", None),
                };
                let mut event = json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Decision",
                    "ts": ticks_to_us(e.now.ticks()),
                    "pid": STREAM_PID,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "sequence": e.sequence,
                        "sample_start_ms": to_millis(e.sample_start.ticks()),
                        "late_ms": to_millis(e.late),
                        "earliness_ms": to_millis(e.earliness),
                        "wait_avg_ms": to_millis(e.wait_avg),
                        "frame_avg_ms": to_millis(e.frame_avg),
                        "render_avg_ms": to_millis(e.render_avg),
                        "normal_run": e.normal_run,
                    }
                });
                if let Some(at) = target {
                    // A waited draw becomes a span up to its target.
                    event["ph"] = json!("X");
                    event["dur"] = json!(ticks_to_us(at.since(e.now).max(0)));
                    if let Some(obj) = event.as_object_mut() {
                        obj.remove("s");
                    }
                }
                events.push(event);
                events.push(json!({
                    "ph": "C",
                    "name": "Averages",
                    "ts": ticks_to_us(e.now.ticks()),
                    "pid": STREAM_PID,
                    "args": {
                        "wait_avg_ms": to_millis(e.wait_avg),
                        "render_avg_ms": to_millis(e.render_avg),
                    }
                }));
            }
            RecordedEvent::Quality(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "Proportion",
                    "ts": ticks_to_us(e.message.timestamp.ticks()),
                    "pid": STREAM_PID,
                    "args": {
                        "proportion": e.message.proportion,
                    }
                }));
                if !e.delivered {
                    events.push(json!({
                        "ph": "i",
                        "name": "QualityUndelivered",
                        "cat": "Quality",
                        "ts": ticks_to_us(e.message.timestamp.ticks()),
                        "pid": STREAM_PID,
                        "tid": 1,
                        "s": "t",
                        "args": {
                            "sequence": e.sequence,
                            "kind": format!("{:?}", e.message.kind),
                        }
                    }));
                }
            }
            RecordedEvent::Render(e) => {
                events.push(json!({
                    "ph": "X",
                    "name": format!("{:?}", e.kind),
                    "cat": "Render",
                    "ts": ticks_to_us(e.start),
                    "dur": ticks_to_us(e.elapsed()),
                    "pid": WALL_PID,
                    "tid": 0,
                    "args": {
                        "accepted": e.accepted,
                        "render_avg_us": ticks_to_us(e.render_avg),
                        "throttle_us": ticks_to_us(e.throttle),
                    }
                }));
            }
            RecordedEvent::Notify(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Notify",
                    "cat": "Quality",
                    "ts": ticks_to_us(stream_now),
                    "pid": STREAM_PID,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "proportion": e.proportion,
                        "throttle_us": ticks_to_us(e.throttle),
                    }
                }));
            }
            RecordedEvent::Reset(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Reset",
                    "cat": "Scheduler",
                    "ts": ticks_to_us(stream_now),
                    "pid": STREAM_PID,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frames_drawn": e.frames_drawn,
                        "frames_dropped": e.frames_dropped,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn process_name(pid: u32, name: &str) -> Value {
    json!({
        "ph": "M",
        "name": "process_name",
        "pid": pid,
        "args": { "name": name },
    })
}

fn ticks_to_us(ticks: Ticks) -> f64 {
    ticks as f64 / 10.0
}
