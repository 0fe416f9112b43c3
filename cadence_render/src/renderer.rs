// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The thread-safe renderer front end.
//!
//! [`Renderer`] owns one [`Scheduler`] behind a single lock. The streaming
//! thread calls [`Renderer::should_draw`] for each sample; the presentation
//! thread brackets each paint with [`Renderer::on_render_start`] and
//! [`Renderer::on_render_end`] (or reports a direct paint with
//! [`Renderer::on_direct_render`]) and calls [`Renderer::reset`] on stream
//! stop, flush, or start. Every entry point holds the lock for its whole
//! duration, including the post-paint throttle sleep.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use cadence_core::scheduler::{
    Decision, RenderPath, Sample, Scheduler, SchedulerConfig, SchedulerState,
};
use cadence_core::stats::{OffsetSummary, PlaybackStats};
use cadence_core::time::{Ticks, from_duration, to_duration, to_millis};
use cadence_core::trace::{
    DecisionEvent, NoopSink, NotifyEvent, QualityEvent, RenderEvent, ResetEvent, TraceSink,
    Tracer,
};
use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::clock::StreamClock;
use crate::error::ScheduleError;
use crate::route::{BoxedQualitySink, QualityRoute, UpstreamPeer};

struct Inner<T> {
    scheduler: Scheduler,
    clock: Option<Arc<dyn StreamClock>>,
    route: QualityRoute,
    render_start: Option<Ticks>,
    sequence: u64,
    sink: T,
}

/// A video renderer's presentation-timing front end.
///
/// `T` receives trace events when the `trace` feature is enabled; it defaults
/// to [`NoopSink`].
pub struct Renderer<T = NoopSink> {
    inner: Mutex<Inner<T>>,
    epoch: Instant,
}

impl<T> core::fmt::Debug for Renderer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Renderer")
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Creates a renderer with no clock, no upstream peer, and no tracing.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_trace_sink(config, NoopSink)
    }
}

impl<T: TraceSink + Send> Renderer<T> {
    /// Creates a renderer that reports trace events to `sink`.
    #[must_use]
    pub fn with_trace_sink(config: SchedulerConfig, sink: T) -> Self {
        Self {
            inner: Mutex::new(Inner {
                scheduler: Scheduler::new(config),
                clock: None,
                route: QualityRoute::new(),
                render_start: None,
                sequence: 0,
                sink,
            }),
            epoch: Instant::now(),
        }
    }

    /// Attaches (or with `None`, detaches) the stream clock.
    pub fn set_clock(&self, clock: Option<Arc<dyn StreamClock>>) {
        self.inner.lock().clock = clock;
    }

    /// Installs a quality sink that takes priority over the upstream peer.
    pub fn set_quality_override(&self, sink: Option<BoxedQualitySink>) {
        _ = self.inner.lock().route.set_override(sink);
    }

    /// Connects the upstream peer whose quality sink receives reports.
    pub fn connect_upstream(&self, peer: Arc<dyn UpstreamPeer>) {
        self.inner.lock().route.connect(peer);
    }

    /// Disconnects the upstream peer.
    pub fn disconnect_upstream(&self) {
        self.inner.lock().route.disconnect();
    }

    /// Decides what to do with `sample` at the clock's current stream time.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::NoClock`] if no clock is attached and
    /// [`ScheduleError::ClockUnavailable`] if the clock reports no time.
    pub fn should_draw(&self, sample: &Sample) -> Result<Decision, ScheduleError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let clock = inner.clock.as_ref().ok_or(ScheduleError::NoClock)?;
        let now = clock.stream_time().ok_or(ScheduleError::ClockUnavailable)?;

        let decision = inner.scheduler.decide(sample, now, &mut inner.route);
        inner.sequence += 1;

        let state = inner.scheduler.state();
        let mut tracer = Tracer::new(&mut inner.sink);
        if let Some(message) = state.last_quality {
            tracer.quality(&QualityEvent {
                sequence: inner.sequence,
                message,
                delivered: state.supplier_handling_quality,
            });
        }
        tracer.decision(&DecisionEvent::new(
            inner.sequence,
            sample,
            now,
            decision,
            state,
        ));

        if decision == Decision::Drop {
            debug!(
                sequence = inner.sequence,
                start = sample.start.ticks(),
                late_ms = to_millis(state.late),
                render_avg_ms = to_millis(state.render_avg),
                "dropping late frame"
            );
        } else {
            trace!(
                sequence = inner.sequence,
                ?decision,
                late = state.late,
                earliness = state.earliness,
                normal_run = state.normal_run,
                "scheduled frame"
            );
        }
        Ok(decision)
    }

    /// Marks the start of a paint.
    pub fn on_render_start(&self) {
        let now = self.wall_ticks();
        self.inner.lock().render_start = Some(now);
    }

    /// Marks the end of a paint started with
    /// [`on_render_start`](Self::on_render_start), then sleeps the throttle.
    ///
    /// Without a matching start the paint is measured as zero-length.
    pub fn on_render_end(&self) {
        let end = self.wall_ticks();
        let mut guard = self.inner.lock();
        let start = guard.render_start.take().unwrap_or(end);
        let throttle = Self::record(&mut guard, RenderPath::Blitted { start, end }, end);
        pause(throttle);
    }

    /// Reports a paint that went straight to the surface, then sleeps the
    /// throttle.
    ///
    /// Direct paints are not timed. The render estimate is discarded and the
    /// last paint is taken to be half a second, so the first blit after
    /// switching back is folded in normally. Any pending
    /// [`on_render_start`](Self::on_render_start) is abandoned. `sample` is
    /// only logged.
    pub fn on_direct_render(&self, sample: &Sample) {
        let now = self.wall_ticks();
        let mut guard = self.inner.lock();
        guard.render_start = None;
        trace!(start = sample.start.ticks(), "direct surface paint");
        let throttle = Self::record(&mut guard, RenderPath::DirectSurface, now);
        pause(throttle);
    }

    /// Applies a quality acknowledgement from the supplier.
    pub fn notify(&self, proportion: u16) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let throttle = inner.scheduler.notify(proportion);
        Tracer::new(&mut inner.sink).notify(&NotifyEvent {
            proportion,
            throttle,
        });
        debug!(proportion, throttle_ms = to_millis(throttle), "quality acknowledged");
    }

    /// Restores the first-frame posture (stream stop, flush, or start).
    pub fn reset(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let stats = inner.scheduler.stats();
        let event = ResetEvent {
            frames_drawn: stats.frames_drawn(),
            frames_dropped: stats.frames_dropped(),
        };
        inner.scheduler.reset();
        inner.render_start = None;
        inner.sequence = 0;
        Tracer::new(&mut inner.sink).reset(&event);
        info!(
            drawn = event.frames_drawn,
            dropped = event.frames_dropped,
            "presentation timing reset"
        );
    }

    /// Frames dropped since the last reset.
    #[must_use]
    pub fn frames_dropped(&self) -> u32 {
        self.inner.lock().scheduler.stats().frames_dropped()
    }

    /// Frames drawn since the last reset.
    #[must_use]
    pub fn frames_drawn(&self) -> u32 {
        self.inner.lock().scheduler.stats().frames_drawn()
    }

    /// Average presentation rate in hundredths of a frame per second.
    #[must_use]
    pub fn avg_frame_rate(&self) -> u32 {
        self.inner.lock().scheduler.stats().avg_frame_rate()
    }

    /// Average incoming sample rate in hundredths of a frame per second.
    #[must_use]
    pub fn incoming_frame_rate(&self) -> u32 {
        self.inner.lock().scheduler.stats().incoming_frame_rate()
    }

    /// Mean sync offset in ms.
    #[must_use]
    pub fn avg_sync_offset_ms(&self) -> i32 {
        self.inner.lock().scheduler.stats().avg_sync_offset_ms()
    }

    /// Standard deviation of the sync offset in ms.
    #[must_use]
    pub fn stddev_sync_offset_ms(&self) -> i32 {
        self.inner.lock().scheduler.stats().stddev_sync_offset_ms()
    }

    /// Standard deviation of the inter-frame time in ms.
    #[must_use]
    pub fn jitter_ms(&self) -> i32 {
        self.inner.lock().scheduler.stats().jitter_ms()
    }

    /// Summary of the most recent sync offsets.
    #[must_use]
    pub fn recent_sync_offset(&self) -> Option<OffsetSummary> {
        self.inner.lock().scheduler.stats().recent_sync_offset()
    }

    /// A copy of the accumulated statistics.
    #[must_use]
    pub fn stats_snapshot(&self) -> PlaybackStats {
        self.inner.lock().scheduler.stats().clone()
    }

    /// A copy of the scheduling state.
    #[must_use]
    pub fn state_snapshot(&self) -> SchedulerState {
        self.inner.lock().scheduler.state().clone()
    }

    /// Runs `f` with exclusive access to the trace sink.
    pub fn with_trace_sink_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.lock().sink)
    }

    /// Consumes the renderer and returns its trace sink.
    #[must_use]
    pub fn into_trace_sink(self) -> T {
        self.inner.into_inner().sink
    }

    fn record(inner: &mut Inner<T>, path: RenderPath, reported_at: Ticks) -> Ticks {
        let outcome = inner.scheduler.record_render(path);
        let render_avg = inner.scheduler.state().render_avg;
        Tracer::new(&mut inner.sink).render(&RenderEvent::new(
            &path,
            reported_at,
            &outcome,
            render_avg,
        ));
        if !outcome.accepted && path != RenderPath::DirectSurface {
            trace!(
                elapsed_ms = to_millis(outcome.elapsed),
                render_avg_ms = to_millis(render_avg),
                "render spike ignored"
            );
        }
        outcome.throttle
    }

    fn wall_ticks(&self) -> Ticks {
        from_duration(self.epoch.elapsed())
    }
}

/// Sleeps `throttle`, or yields when there is nothing to wait for.
fn pause(throttle: Ticks) {
    if throttle > 0 {
        thread::sleep(to_duration(throttle));
    } else {
        thread::yield_now();
    }
}
