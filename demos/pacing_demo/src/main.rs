// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated playback that exercises the renderer and its diagnostics.
//!
//! Plays 120 frames at 30 fps through a [`Renderer`] driven by a manual
//! stream clock, with real (sleeping) paints measured on the wall clock. The
//! decoder stalls for half a second at frame 45; from frame 60 on an upstream
//! supplier acts on quality reports and acknowledges them. Events go to a
//! [`PrettyPrintSink`] (drops and acknowledgements only) and a
//! [`RecorderSink`], which is exported as a Chrome trace at the end.
//!
//! A deterministic [`Simulator`] run of the same stream is then graded with a
//! [`SyncTracker`].
//!
//! Log verbosity follows `RUST_LOG` (default `info,cadence_render=debug`).

use std::fs::File;
use std::io::BufWriter;
use std::sync::{Arc, mpsc};
use std::thread;

use cadence_core::quality::{QualityMessage, QualitySink, SendError};
use cadence_core::scheduler::{Decision, Sample, Scheduler, SchedulerConfig};
use cadence_core::time::{StreamTime, millis, to_duration, to_millis};
use cadence_core::trace::{
    DecisionEvent, NotifyEvent, QualityEvent, RenderEvent, ResetEvent, TraceSink,
};
use cadence_debug::pretty::PrettyPrintSink;
use cadence_debug::recorder::RecorderSink;
use cadence_render::{BoxedQualitySink, ManualClock, Renderer, UpstreamPeer};
use cadence_sync_harness::SyncTracker;
use cadence_sync_harness::sim::{Simulator, Stall, StreamProfile, SupplierPolicy};
use tracing::info;
use tracing_subscriber::EnvFilter;

const FRAME_COUNT: i64 = 120;
const FPS: i64 = 30;
const PAINT_MS: i64 = 14;
const STALL_FRAME: i64 = 45;
const STALL_MS: i64 = 500;
const SUPPLIER_FRAME: i64 = 60;

/// Sends every event to both a printer and a recorder.
struct Tee {
    pretty: PrettyPrintSink,
    recorder: RecorderSink,
}

impl TraceSink for Tee {
    fn on_decision(&mut self, e: &DecisionEvent) {
        self.pretty.on_decision(e);
        self.recorder.on_decision(e);
    }

    fn on_quality(&mut self, e: &QualityEvent) {
        self.pretty.on_quality(e);
        self.recorder.on_quality(e);
    }

    fn on_render(&mut self, e: &RenderEvent) {
        self.pretty.on_render(e);
        self.recorder.on_render(e);
    }

    fn on_notify(&mut self, e: &NotifyEvent) {
        self.pretty.on_notify(e);
        self.recorder.on_notify(e);
    }

    fn on_reset(&mut self, e: &ResetEvent) {
        self.pretty.on_reset(e);
        self.recorder.on_reset(e);
    }
}

/// A decoder that forwards quality reports to the playback loop.
struct Decoder {
    reports: mpsc::Sender<u16>,
}

struct DecoderSink(mpsc::Sender<u16>);

impl QualitySink for DecoderSink {
    fn send(&mut self, message: &QualityMessage) -> Result<(), SendError> {
        self.0
            .send(message.proportion)
            .map_err(|_| SendError::Disconnected)
    }
}

impl UpstreamPeer for Decoder {
    fn quality_sink(&self) -> Option<BoxedQualitySink> {
        Some(Box::new(DecoderSink(self.reports.clone())))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,cadence_render=debug")),
        )
        .init();

    let trace_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "pacing_trace.json".to_owned());

    // -- renderer ----------------------------------------------------------
    let sink = Tee {
        pretty: PrettyPrintSink::stderr().drops_only(),
        recorder: RecorderSink::new(),
    };
    let renderer = Renderer::with_trace_sink(SchedulerConfig::standard(), sink);
    let clock = ManualClock::default();
    renderer.set_clock(Some(Arc::new(clock.clone())));
    let (reports_tx, reports_rx) = mpsc::channel();

    // -- playback loop -----------------------------------------------------
    let frame = StreamProfile::at_fps(FPS, millis(PAINT_MS)).frame_duration;
    for index in 0..FRAME_COUNT {
        if index == STALL_FRAME {
            info!(frame = index, stall_ms = STALL_MS, "decoder stalls");
            _ = clock.advance(millis(STALL_MS));
        }
        if index == SUPPLIER_FRAME {
            info!(frame = index, "decoder starts handling quality");
            renderer.connect_upstream(Arc::new(Decoder {
                reports: reports_tx.clone(),
            }));
        }

        let start = StreamTime(index * frame);
        let sample = Sample::new(start, start.saturating_add(frame));
        if clock.now() < start {
            clock.set(start);
        }

        match renderer.should_draw(&sample)? {
            Decision::Drop => continue,
            Decision::DrawNow => {}
            Decision::DrawAt(at) => {
                if clock.now() < at {
                    clock.set(at);
                }
            }
        }

        renderer.on_render_start();
        thread::sleep(to_duration(millis(PAINT_MS)));
        renderer.on_render_end();
        _ = clock.advance(millis(PAINT_MS));

        // The decoder acknowledges its most recent report.
        if let Some(proportion) = reports_rx.try_iter().last() {
            renderer.notify(proportion);
        }
    }

    info!(
        drawn = renderer.frames_drawn(),
        dropped = renderer.frames_dropped(),
        fps_hundredths = renderer.avg_frame_rate(),
        incoming_fps_hundredths = renderer.incoming_frame_rate(),
        sync_offset_ms = renderer.avg_sync_offset_ms(),
        sync_stddev_ms = renderer.stddev_sync_offset_ms(),
        jitter_ms = renderer.jitter_ms(),
        "playback finished"
    );
    if let Some(recent) = renderer.recent_sync_offset() {
        info!(
            avg_ms = to_millis(recent.average),
            min_ms = to_millis(recent.min),
            max_ms = to_millis(recent.max),
            "recent sync offsets"
        );
    }
    renderer.reset();

    // -- chrome trace ------------------------------------------------------
    let Tee { recorder, .. } = renderer.into_trace_sink();
    let file = File::create(&trace_path)?;
    let mut writer = BufWriter::new(file);
    cadence_debug::chrome::export(recorder.as_bytes(), &mut writer)?;
    info!(
        path = %trace_path,
        events = recorder.len(),
        "wrote Chrome trace; open in chrome://tracing or https://ui.perfetto.dev"
    );

    // -- deterministic replay ----------------------------------------------
    let mut sim = Simulator::new(
        Scheduler::default(),
        StreamProfile::at_fps(FPS, millis(PAINT_MS)),
        SupplierPolicy::Ignore,
    )
    .with_stall(Stall::resyncing(STALL_FRAME, millis(STALL_MS)));
    let frame_ms = to_millis(frame) as f64;
    let mut tracker = SyncTracker::<48>::new(frame_ms);
    let mut report = None;
    for record in sim.run(usize::try_from(FRAME_COUNT)?) {
        report = Some(tracker.observe_record(&record));
    }
    if let Some(report) = report {
        info!(
            grade = report.grade.as_str(),
            drops = report.dropped_frames,
            frames = report.total_frames,
            "simulated playback"
        );
    }
    info!(
        deltas = %tracker.sparkline_ascii(frame_ms * 0.5, frame_ms * 2.0),
        "frame intervals"
    );

    Ok(())
}
