// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame scheduling: draw now, draw later, or drop.
//!
//! The [`Scheduler`] turns a [`Sample`] and the current stream time into a
//! [`Decision`], sending one [`QualityMessage`] upstream per call and folding
//! the outcome into its running averages. Paint cost is fed back through
//! [`Scheduler::record_render`], and inbound acknowledgements through
//! [`Scheduler::notify`]. See the [`Scheduler`] struct docs for the model.

use crate::average::Ema;
use crate::quality::{QualityMessage, QualitySink, throttle_for_proportion};
use crate::stats::PlaybackStats;
use crate::time::{MILLISECOND, SECOND, StreamTime, Ticks};

/// Configuration for the [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Expected display latency. Samples starting at or after this are
    /// scheduled this much earlier. Zero disables compensation.
    pub display_lag: Ticks,
    /// Lateness is clamped to `±lateness_clamp` before use.
    pub lateness_clamp: Ticks,
    /// Period of the exponential moving averages.
    pub average_period: i64,
    /// A wait average above this means there is slack, so lateness is
    /// treated as a glitch rather than a reason to drop.
    pub wait_slack: Ticks,
    /// Longest time without a draw before a frame is forced out.
    pub stale_interval: Ticks,
    /// Frames are never played early by more than this.
    pub max_early_leap: Ticks,
    /// Catch-up play is only allowed while less than this many frame
    /// durations early.
    pub max_early_frames: i64,
    /// While the supplier handles quality, frames up to this many durations
    /// late are still drawn.
    pub supplier_grace_frames: i64,
}

impl SchedulerConfig {
    /// Default configuration for display-attached playback.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            display_lag: 8 * MILLISECOND,
            lateness_clamp: 50 * MILLISECOND,
            average_period: 10,
            wait_slack: 8 * MILLISECOND,
            stale_interval: SECOND,
            max_early_leap: 900 * MILLISECOND,
            max_early_frames: 10,
            supplier_grace_frames: 4,
        }
    }

    /// Disables display-lag compensation, for sinks that present without
    /// a refresh delay (offscreen capture, tests).
    #[must_use]
    pub const fn without_display_lag(mut self) -> Self {
        self.display_lag = 0;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// A decoded frame offered for presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Nominal presentation start.
    pub start: StreamTime,
    /// Nominal presentation end.
    pub end: StreamTime,
    /// The supplier skipped at least one frame before this one.
    pub discontinuity: bool,
}

impl Sample {
    /// Creates a continuous sample spanning `[start, end)`.
    #[must_use]
    pub const fn new(start: StreamTime, end: StreamTime) -> Self {
        Self {
            start,
            end,
            discontinuity: false,
        }
    }

    /// Marks the sample as following a supplier-side drop.
    #[must_use]
    pub const fn with_discontinuity(mut self) -> Self {
        self.discontinuity = true;
        self
    }

    /// Nominal duration of the sample.
    #[must_use]
    pub const fn duration(&self) -> Ticks {
        self.end.since(self.start)
    }
}

/// What to do with a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Present immediately.
    DrawNow,
    /// Present once the stream clock reaches the given (adjusted) start.
    DrawAt(StreamTime),
    /// Do not present.
    Drop,
}

impl Decision {
    /// Returns `true` unless the sample is dropped.
    #[must_use]
    pub const fn is_draw(self) -> bool {
        !matches!(self, Self::Drop)
    }
}

/// A measured paint, in wall-clock ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPath {
    /// A paint measured around a separate present/blit step.
    Blitted {
        /// When painting began.
        start: Ticks,
        /// When painting finished.
        end: Ticks,
    },
    /// A backend that paints straight to the surface and cannot be timed.
    /// The render estimate is discarded and the last paint is assumed to
    /// have taken half a second, so the first blit after switching back is
    /// never mistaken for a spike.
    DirectSurface,
}

impl RenderPath {
    /// Time spent painting, never negative. Zero for untimed paths.
    #[must_use]
    pub const fn elapsed(&self) -> Ticks {
        match *self {
            Self::Blitted { start, end } => {
                let elapsed = end.saturating_sub(start);
                if elapsed < 0 { 0 } else { elapsed }
            }
            Self::DirectSurface => 0,
        }
    }
}

/// Result of folding one paint measurement into the render average.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Measured paint time.
    pub elapsed: Ticks,
    /// Whether the measurement moved the render average (spikes and untimed
    /// paints do not).
    pub accepted: bool,
    /// Delay the caller should sleep before the next paint.
    pub throttle: Ticks,
}

/// Render paint cost assumed after a switch to [`RenderPath::DirectSurface`].
const DIRECT_RENDER_LAST: Ticks = SECOND / 2;

/// Mutable scheduling state, exposed read-only for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerState {
    /// Moving average of paint time.
    pub render_avg: Ticks,
    /// Most recent paint time, spikes included.
    pub render_last: Ticks,
    /// Moving average of how long frames waited before their start time.
    pub wait_avg: Ticks,
    /// Moving average of the inter-frame interval; negative until known.
    pub frame_avg: Ticks,
    /// Last nominal frame duration seen.
    pub frame_duration: Ticks,
    /// How far ahead of schedule frames are being played (never positive).
    pub earliness: Ticks,
    /// Consecutive frames drawn at their normal time; `-1` after a drop.
    pub normal_run: i32,
    /// Delay requested by the last acknowledgement.
    pub throttle: Ticks,
    /// The last quality report was accepted upstream.
    pub supplier_handling_quality: bool,
    /// Stream time of the most recently scheduled draw.
    pub last_draw_time: StreamTime,
    /// Lateness of the most recent sample after clamping.
    pub late: Ticks,
    /// Most recent quality report.
    pub last_quality: Option<QualityMessage>,
}

impl SchedulerState {
    /// The first-frame posture.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            render_avg: 0,
            render_last: 0,
            wait_avg: 0,
            frame_avg: -1,
            frame_duration: 0,
            earliness: 0,
            normal_run: 0,
            throttle: 0,
            supplier_handling_quality: false,
            last_draw_time: StreamTime::AGES_AGO,
            late: 0,
            last_quality: None,
        }
    }
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::initial()
    }
}

/// The presentation contract between a renderer and its scheduling engine.
///
/// [`Scheduler`] is the standard implementation; hosts that drive an engine
/// directly (simulators, alternative policies) program against this trait.
pub trait FrameScheduler {
    /// Decides what to do with `sample` at stream time `now`, reporting
    /// quality to `sink`.
    fn should_draw(
        &mut self,
        sample: &Sample,
        now: StreamTime,
        sink: &mut dyn QualitySink,
    ) -> Decision;

    /// Folds a paint measurement into the render average.
    fn record_render(&mut self, path: RenderPath) -> RenderOutcome;

    /// Applies an inbound acknowledgement and returns the new throttle.
    fn notify(&mut self, proportion: u16) -> Ticks;

    /// Restores the first-frame posture.
    fn reset(&mut self);

    /// Statistics accumulated since the last reset.
    fn stats(&self) -> &PlaybackStats;
}

/// Frame scheduler deciding when (and whether) each sample is presented.
///
/// # Model
///
/// The scheduler tracks three moving averages: paint time, inter-frame time,
/// and how long frames wait before their start. A late frame is dropped only
/// when painting is expensive relative to the frame interval, the frame is
/// well behind, there is no slack in the wait average, and a frame was drawn
/// recently. After a drop the next drawn frame is played as soon as possible,
/// and an *earliness* budget lets following frames run slightly ahead of
/// schedule, decaying by an eighth per frame back to zero.
///
/// # Usage
///
/// ```rust,ignore
/// match scheduler.decide(&sample, now, &mut sink) {
///     Decision::DrawNow => paint(),
///     Decision::DrawAt(at) => { wait_until(at); paint() }
///     Decision::Drop => {}
/// }
/// let outcome = scheduler.record_render(RenderPath::Blitted { start, end });
/// sleep(outcome.throttle);
/// ```
#[derive(Clone, Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    ema: Ema,
    state: SchedulerState,
    stats: PlaybackStats,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::standard())
    }
}

impl Scheduler {
    /// Creates a scheduler in the first-frame posture.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            ema: Ema::new(config.average_period),
            config,
            state: SchedulerState::initial(),
            stats: PlaybackStats::default(),
        }
    }

    /// Decides what to do with `sample` at stream time `now`.
    ///
    /// Sends exactly one quality report to `sink`; a failed send is absorbed
    /// and only clears [`SchedulerState::supplier_handling_quality`].
    pub fn decide(
        &mut self,
        sample: &Sample,
        now: StreamTime,
        sink: &mut dyn QualitySink,
    ) -> Decision {
        let cfg = self.config;
        let ema = self.ema;
        self.stats.record_arrival(now);

        let nominal_start = sample.start;
        let mut start = sample.start;
        let mut end = sample.end;
        if cfg.display_lag > 0 && start.ticks() >= cfg.display_lag {
            start = start.saturating_sub(cfg.display_lag);
            end = end.saturating_sub(cfg.display_lag);
        }
        let duration = end.since(start);

        let bound = cfg.lateness_clamp.saturating_abs();
        let late = now.since(start).clamp(-bound, bound);
        self.state.late = late;

        let message = QualityMessage::assess(
            late,
            now,
            self.state.frame_avg,
            self.state.render_avg,
            self.state.wait_avg,
        );
        self.state.supplier_handling_quality = sink.send(&message).is_ok();
        self.state.last_quality = Some(message);

        let st = &mut self.state;

        // Frame-rate change: resync the interval average to the new duration.
        // Both durations are positive past the first two tests.
        let fd = st.frame_duration;
        if fd <= 0 || duration <= 0 || duration.abs_diff(fd) > fd.unsigned_abs() / 32 {
            st.frame_avg = duration;
            st.frame_duration = duration;
        }

        let just_dropped =
            (st.supplier_handling_quality && sample.discontinuity) || st.normal_run == -1;

        if late > 0 {
            st.earliness = 0;
        } else if late >= st.earliness || just_dropped {
            st.earliness = late;
        } else {
            st.earliness -= st.earliness / 8;
        }

        let wait_avg = ema.mix(st.wait_avg, (-late).max(0));
        let since_draw = now.since(st.last_draw_time);
        let mut frame_time = since_draw.min(cfg.stale_interval);

        let cheap_paint = st.render_avg.saturating_mul(3) <= st.frame_avg;
        let close_enough = if st.supplier_handling_quality {
            late <= duration.saturating_mul(cfg.supplier_grace_frames)
        } else {
            late.saturating_mul(2) < duration
        };
        let has_slack = st.wait_avg > cfg.wait_slack;
        let stale = since_draw > cfg.stale_interval;

        if !(cheap_paint || close_enough || has_slack || stale) {
            st.wait_avg = wait_avg;
            st.normal_run = -1;
            self.stats.record_drop();
            return Decision::Drop;
        }

        let behind = st.frame_avg > duration.saturating_add(duration / 16)
            && late > duration.saturating_mul(cfg.max_early_frames).saturating_neg();
        let play_asap =
            (just_dropped || behind) && late >= cfg.max_early_leap.saturating_neg();

        let decision;
        let presented;
        if play_asap {
            st.normal_run = 0;
            st.wait_avg = ema.decay(st.wait_avg);
            st.frame_avg = ema.mix(st.frame_avg, frame_time);
            st.last_draw_time = now;
            st.earliness = st.earliness.min(late);
            decision = Decision::DrawNow;
            presented = now;
        } else {
            st.normal_run = st.normal_run.saturating_add(1);
            st.frame_avg = duration;
            let adjusted = start.saturating_add(st.earliness.clamp(-st.frame_avg.max(0), 0));
            st.wait_avg = wait_avg;
            if late < 0 {
                frame_time = adjusted.since(st.last_draw_time);
                st.last_draw_time = adjusted;
                decision = Decision::DrawAt(adjusted);
                presented = adjusted;
            } else {
                st.last_draw_time = now;
                decision = Decision::DrawNow;
                presented = now;
            }
        }

        self.stats
            .record_draw(presented, presented.since(nominal_start), frame_time);
        decision
    }

    /// Folds a paint measurement into the render average and returns the
    /// throttle to sleep before the next paint.
    ///
    /// A sample more than twice the current average *and* more than twice the
    /// previous sample is treated as a spike: it only updates
    /// [`SchedulerState::render_last`]. Consecutive slow paints are therefore
    /// accepted from the second one on.
    ///
    /// [`RenderPath::DirectSurface`] carries no measurement: it clears the
    /// average, sets `render_last` to half a second and only returns the
    /// throttle.
    pub fn record_render(&mut self, path: RenderPath) -> RenderOutcome {
        let st = &mut self.state;
        if path == RenderPath::DirectSurface {
            st.render_avg = 0;
            st.render_last = DIRECT_RENDER_LAST;
            return RenderOutcome {
                elapsed: 0,
                accepted: false,
                throttle: st.throttle,
            };
        }

        let elapsed = path.elapsed();
        let spike = elapsed > st.render_avg.saturating_mul(2)
            && elapsed > st.render_last.saturating_mul(2);
        let accepted = !spike;
        if accepted {
            st.render_avg = self.ema.mix(st.render_avg, elapsed);
        }
        st.render_last = elapsed;

        RenderOutcome {
            elapsed,
            accepted,
            throttle: st.throttle,
        }
    }

    /// Applies an inbound acknowledgement and returns the new throttle.
    pub fn notify(&mut self, proportion: u16) -> Ticks {
        self.state.throttle = throttle_for_proportion(proportion);
        self.state.throttle
    }

    /// Restores the first-frame posture and clears all statistics.
    ///
    /// Resetting twice is the same as resetting once.
    pub fn reset(&mut self) {
        self.state = SchedulerState::initial();
        self.stats = PlaybackStats::default();
    }

    /// Current scheduling state.
    #[must_use]
    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Statistics accumulated since the last reset.
    #[must_use]
    pub fn stats(&self) -> &PlaybackStats {
        &self.stats
    }

    /// The configuration this scheduler was built with.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

impl FrameScheduler for Scheduler {
    fn should_draw(
        &mut self,
        sample: &Sample,
        now: StreamTime,
        sink: &mut dyn QualitySink,
    ) -> Decision {
        self.decide(sample, now, sink)
    }

    fn record_render(&mut self, path: RenderPath) -> RenderOutcome {
        Self::record_render(self, path)
    }

    fn notify(&mut self, proportion: u16) -> Ticks {
        Self::notify(self, proportion)
    }

    fn reset(&mut self) {
        Self::reset(self);
    }

    fn stats(&self) -> &PlaybackStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::quality::{Disconnected, SendError};
    use crate::time::millis;

    /// Accepts every report and keeps it.
    #[derive(Default)]
    struct Accepting {
        sent: Vec<QualityMessage>,
    }

    impl QualitySink for Accepting {
        fn send(&mut self, message: &QualityMessage) -> Result<(), SendError> {
            self.sent.push(*message);
            Ok(())
        }
    }

    fn frame(start_ms: i64, duration_ms: i64) -> Sample {
        Sample::new(
            StreamTime::from_millis(start_ms),
            StreamTime::from_millis(start_ms + duration_ms),
        )
    }

    fn blit(sched: &mut Scheduler, ms: i64) {
        _ = sched.record_render(RenderPath::Blitted {
            start: 0,
            end: millis(ms),
        });
    }

    /// Warms a 33 ms stream with expensive (15 ms) paints so lateness matters.
    ///
    /// Twenty frames bring the render average to just under 13 ms, above the
    /// third of a frame where painting stops counting as cheap.
    fn warmed(frames: i64) -> (Scheduler, i64) {
        let mut sched = Scheduler::default();
        for i in 0..frames {
            let t = i * 33;
            let d = sched.decide(&frame(t, 33), StreamTime::from_millis(t), &mut Disconnected);
            assert!(d.is_draw(), "warm-up frame {i} should draw");
            blit(&mut sched, 15);
        }
        (sched, frames * 33)
    }

    #[test]
    fn on_time_stream_draws_every_frame() {
        let mut sched = Scheduler::default();
        for i in 0..10 {
            let t = i * 33;
            let d = sched.decide(&frame(t, 33), StreamTime::from_millis(t), &mut Disconnected);
            assert_eq!(d, Decision::DrawNow, "frame {i}");
        }
        let stats = sched.stats();
        assert_eq!(stats.frames_drawn(), 10);
        assert_eq!(stats.frames_dropped(), 0);
        assert_eq!(stats.avg_sync_offset_ms(), 0);
        assert_eq!(stats.jitter_ms(), 0);
        assert_eq!(stats.avg_frame_rate(), 3030);
        assert_eq!(sched.state().normal_run, 10);
    }

    #[test]
    fn early_frame_waits_for_its_start() {
        let mut sched = Scheduler::new(SchedulerConfig::standard().without_display_lag());
        let d = sched.decide(&frame(0, 40), StreamTime::ZERO, &mut Disconnected);
        assert_eq!(d, Decision::DrawNow);
        let d = sched.decide(&frame(40, 40), StreamTime::from_millis(30), &mut Disconnected);
        assert_eq!(d, Decision::DrawAt(StreamTime::from_millis(40)));
        assert_eq!(sched.state().last_draw_time, StreamTime::from_millis(40));
        // Mixed in 10 ms of waiting with period 10.
        assert_eq!(sched.state().wait_avg, millis(1));
    }

    #[test]
    fn display_lag_moves_the_start_earlier() {
        let mut sched = Scheduler::default();
        _ = sched.decide(&frame(0, 40), StreamTime::ZERO, &mut Disconnected);
        let d = sched.decide(&frame(100, 40), StreamTime::from_millis(50), &mut Disconnected);
        assert_eq!(d, Decision::DrawAt(StreamTime::from_millis(92)));
        // Clamped to the lateness window.
        assert_eq!(sched.state().late, millis(-42));
    }

    #[test]
    fn stall_drops_then_catches_up() {
        let (mut sched, t) = warmed(20);
        assert!(sched.state().render_avg > millis(11), "painting is expensive");

        let d = sched.decide(&frame(t, 33), StreamTime::from_millis(t + 500), &mut Disconnected);
        assert_eq!(d, Decision::Drop);
        assert_eq!(sched.state().normal_run, -1);
        assert_eq!(sched.stats().frames_dropped(), 1);

        let next = t + 500;
        let d = sched.decide(&frame(next, 33), StreamTime::from_millis(next), &mut Disconnected);
        assert_eq!(d, Decision::DrawNow);
        assert_eq!(sched.state().normal_run, 0);
    }

    #[test]
    fn cheap_paint_never_drops() {
        let mut sched = Scheduler::default();
        _ = sched.decide(&frame(0, 33), StreamTime::ZERO, &mut Disconnected);
        blit(&mut sched, 2);
        blit(&mut sched, 2);
        let d = sched.decide(&frame(33, 33), StreamTime::from_millis(600), &mut Disconnected);
        assert!(d.is_draw(), "painting is cheap, dropping would not help");
    }

    #[test]
    fn supplier_handling_quality_relaxes_dropping() {
        let (mut sched, t) = warmed(20);
        let mut sink = Accepting::default();
        // 48 ms late after display-lag compensation would drop locally; with
        // the supplier compensating it is within 4 frames.
        let d = sched.decide(&frame(t, 33), StreamTime::from_millis(t + 40), &mut sink);
        assert!(d.is_draw(), "supplier is compensating");
        assert!(sched.state().supplier_handling_quality);
        assert_eq!(sink.sent.len(), 1);
    }

    #[test]
    fn stale_picture_is_forced_out() {
        let (mut sched, t) = warmed(20);
        // Keep dropping until over a second has passed since the last draw.
        let mut now = t + 200;
        let mut start = t;
        loop {
            let d = sched.decide(&frame(start, 33), StreamTime::from_millis(now), &mut Disconnected);
            if d.is_draw() {
                break;
            }
            assert!(now - t < 1300, "must draw once the picture is stale");
            now += 100;
            start += 100;
        }
        assert!(sched.stats().frames_dropped() > 0, "some frames should drop first");
    }

    #[test]
    fn rate_change_resets_frame_average() {
        let mut sched = Scheduler::default();
        _ = sched.decide(&frame(0, 40), StreamTime::ZERO, &mut Disconnected);
        assert_eq!(sched.state().frame_duration, millis(40));
        _ = sched.decide(&frame(40, 20), StreamTime::from_millis(40), &mut Disconnected);
        assert_eq!(sched.state().frame_duration, millis(20));
        assert_eq!(sched.state().frame_avg, millis(20));
    }

    #[test]
    fn zero_duration_is_tolerated() {
        let mut sched = Scheduler::default();
        for _ in 0..2 {
            let d = sched.decide(&frame(100, 0), StreamTime::from_millis(100), &mut Disconnected);
            // Nothing has been painted, so painting counts as cheap.
            assert_eq!(d, Decision::DrawNow);
            assert_eq!(sched.state().frame_duration, 0);
            assert_eq!(sched.state().frame_avg, 0);
        }
        assert_eq!(sched.state().normal_run, 2);
    }

    #[test]
    fn negative_duration_only_draws_when_stale() {
        let mut sched = Scheduler::default();
        let backwards = frame(100, -40);
        let d = sched.decide(&backwards, StreamTime::from_millis(100), &mut Disconnected);
        assert_eq!(d, Decision::DrawNow, "nothing drawn yet, the picture is stale");
        assert_eq!(sched.state().frame_avg, millis(-40));

        let d = sched.decide(&backwards, StreamTime::from_millis(110), &mut Disconnected);
        assert_eq!(d, Decision::Drop);

        let d = sched.decide(&backwards, StreamTime::from_millis(1200), &mut Disconnected);
        assert_eq!(d, Decision::DrawNow, "over a second without a draw");
        assert_eq!(sched.state().normal_run, 0);
    }

    #[test]
    fn open_ended_sample_draws() {
        let mut sched = Scheduler::default();
        let d = sched.decide(
            &Sample::new(StreamTime::ZERO, StreamTime(i64::MAX)),
            StreamTime::ZERO,
            &mut Disconnected,
        );
        assert_eq!(d, Decision::DrawNow);
        assert_eq!(sched.state().frame_duration, i64::MAX);

        let d = sched.decide(
            &Sample::new(StreamTime::from_millis(40), StreamTime(i64::MAX)),
            StreamTime::from_millis(40),
            &mut Disconnected,
        );
        assert_eq!(d, Decision::DrawNow);
        assert_eq!(sched.state().late, millis(8));
        assert_eq!(sched.stats().frames_drawn(), 2);
    }

    #[test]
    fn extreme_starts_saturate() {
        let mut sched = Scheduler::default();
        let ancient = Sample::new(
            StreamTime(i64::MIN),
            StreamTime(i64::MIN).saturating_add(millis(40)),
        );
        let d = sched.decide(&ancient, StreamTime::ZERO, &mut Disconnected);
        assert_eq!(d, Decision::DrawNow);
        assert_eq!(sched.state().late, millis(50), "clamped");
        let recent = sched.stats().recent_sync_offset().unwrap();
        assert_eq!(recent.last, millis(1000), "offset is clamped");

        let mut sched = Scheduler::default();
        let inverted = Sample::new(StreamTime(i64::MAX), StreamTime(i64::MIN));
        let d = sched.decide(&inverted, StreamTime::ZERO, &mut Disconnected);
        assert_eq!(d, Decision::DrawAt(StreamTime(i64::MAX - millis(8))));
        assert_eq!(sched.state().frame_avg, i64::MIN);
        assert_eq!(sched.state().late, millis(-50));
    }

    #[test]
    fn quality_report_sent_every_decision() {
        let mut sched = Scheduler::default();
        let mut sink = Accepting::default();
        for i in 0..4 {
            _ = sched.decide(&frame(i * 33, 33), StreamTime::from_millis(i * 33), &mut sink);
        }
        assert_eq!(sink.sent.len(), 4);
        assert_eq!(sink.sent[0].proportion, 1000, "no data yet");
        assert_eq!(sched.state().last_quality, sink.sent.last().copied());
    }

    #[test]
    fn render_spike_only_updates_last() {
        let mut sched = Scheduler::default();
        blit(&mut sched, 10);
        assert_eq!(sched.state().render_avg, 0, "nothing to compare against yet");
        blit(&mut sched, 10);
        assert_eq!(sched.state().render_avg, millis(1));
        blit(&mut sched, 2);
        let avg = sched.state().render_avg;
        let out = sched.record_render(RenderPath::Blitted {
            start: millis(5),
            end: millis(105),
        });
        assert!(!out.accepted);
        assert_eq!(out.elapsed, millis(100));
        assert_eq!(sched.state().render_avg, avg);
        assert_eq!(sched.state().render_last, millis(100));
    }

    #[test]
    fn negative_render_span_is_zero() {
        let mut sched = Scheduler::default();
        let out = sched.record_render(RenderPath::Blitted {
            start: millis(5),
            end: 0,
        });
        assert_eq!(out.elapsed, 0);
    }

    #[test]
    fn direct_render_discards_the_estimate() {
        let (mut sched, _) = warmed(4);
        _ = sched.notify(800);
        assert!(sched.state().render_avg > 0);
        let out = sched.record_render(RenderPath::DirectSurface);
        assert!(!out.accepted, "nothing was measured");
        assert_eq!(out.elapsed, 0);
        assert_eq!(out.throttle, sched.state().throttle);
        assert_eq!(sched.state().render_avg, 0);
        assert_eq!(sched.state().render_last, millis(500));
    }

    #[test]
    fn blit_after_direct_render_is_accepted() {
        let mut sched = Scheduler::default();
        _ = sched.record_render(RenderPath::DirectSurface);
        let out = sched.record_render(RenderPath::Blitted {
            start: 0,
            end: millis(10),
        });
        assert!(out.accepted);
        assert_eq!(sched.state().render_avg, millis(1));
        assert_eq!(sched.state().render_last, millis(10));
    }

    #[test]
    fn blit_after_zero_length_blit_is_a_spike() {
        // Without the direct-render reset the estimate has nothing to
        // compare against and rejects the first real paint.
        let mut sched = Scheduler::default();
        blit(&mut sched, 0);
        let out = sched.record_render(RenderPath::Blitted {
            start: 0,
            end: millis(10),
        });
        assert!(!out.accepted);
    }

    #[test]
    fn notify_sets_throttle() {
        let mut sched = Scheduler::default();
        assert_eq!(sched.notify(1000), 0);
        let throttle = sched.notify(500);
        assert_eq!(throttle, 388_880_000 / 667 - 330_000);
        let out = sched.record_render(RenderPath::Blitted { start: 0, end: 1 });
        assert_eq!(out.throttle, throttle);
    }

    #[test]
    fn reset_is_idempotent() {
        let (mut sched, _) = warmed(8);
        _ = sched.notify(100);
        sched.reset();
        let once = (sched.state().clone(), sched.stats().clone());
        sched.reset();
        assert_eq!(sched.state(), &once.0);
        assert_eq!(sched.stats(), &once.1);
        assert_eq!(sched.state(), &SchedulerState::initial());
        assert_eq!(sched.stats().frames_drawn(), 0);
        assert_eq!(sched.stats().avg_sync_offset_ms(), 0);
    }

    #[test]
    fn trait_drives_the_scheduler() {
        fn drive(engine: &mut dyn FrameScheduler) -> Decision {
            engine.should_draw(&frame(0, 33), StreamTime::ZERO, &mut Disconnected)
        }
        let mut sched = Scheduler::default();
        assert_eq!(drive(&mut sched), Decision::DrawNow);
        assert_eq!(FrameScheduler::stats(&sched).frames_drawn(), 1);
    }
}
