// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic playback simulation.
//!
//! A [`Simulator`] plays a synthetic stream through any [`FrameScheduler`]
//! on a single virtual timeline that serves as both the stream clock and the
//! wall clock. The simulated supplier delivers frame `i` (nominal start
//! `i · frame_duration`) `lead` ticks ahead of its start, or as soon as the
//! presenter is free if that moment has passed. Drawn frames wait for their
//! target time, cost `paint_cost` to paint, and are followed by the
//! scheduler's throttle.
//!
//! [`Stall`]s freeze the supplier before a chosen frame, which is then
//! delivered late. A resyncing supplier marks the first frame after the
//! frames it skipped as a discontinuity.

use alloc::vec::Vec;

use cadence_core::quality::{QualityMessage, QualitySink, SendError};
use cadence_core::scheduler::{Decision, FrameScheduler, RenderPath, Sample};
use cadence_core::time::{SECOND, StreamTime, Ticks};

/// Shape of the simulated stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamProfile {
    /// Nominal duration of every frame.
    pub frame_duration: Ticks,
    /// Time each paint takes.
    pub paint_cost: Ticks,
    /// How far ahead of its start a frame is delivered.
    pub lead: Ticks,
}

impl StreamProfile {
    /// Frames of `frame_duration` delivered exactly at their start.
    #[must_use]
    pub const fn new(frame_duration: Ticks, paint_cost: Ticks) -> Self {
        Self {
            frame_duration,
            paint_cost,
            lead: 0,
        }
    }

    /// `fps` frames per second delivered exactly at their start.
    #[must_use]
    pub const fn at_fps(fps: i64, paint_cost: Ticks) -> Self {
        Self::new(SECOND / fps, paint_cost)
    }

    /// Delivers frames `lead` ticks ahead of their start.
    #[must_use]
    pub const fn with_lead(mut self, lead: Ticks) -> Self {
        self.lead = lead;
        self
    }

    fn start_of(&self, index: i64) -> StreamTime {
        StreamTime(index.saturating_mul(self.frame_duration))
    }
}

/// A supplier stall before one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stall {
    /// Index of the frame that arrives late.
    pub at_frame: i64,
    /// How long the supplier is frozen.
    pub length: Ticks,
    /// After delivering the late frame, the supplier skips every frame whose
    /// delivery time has already passed instead of queueing them.
    pub skip_missed: bool,
}

impl Stall {
    /// A stall after which the supplier resynchronizes with the clock.
    #[must_use]
    pub const fn resyncing(at_frame: i64, length: Ticks) -> Self {
        Self {
            at_frame,
            length,
            skip_missed: true,
        }
    }

    /// A stall after which the supplier delivers the backlog in order.
    #[must_use]
    pub const fn queued(at_frame: i64, length: Ticks) -> Self {
        Self {
            at_frame,
            length,
            skip_missed: false,
        }
    }
}

/// How the simulated supplier treats quality reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupplierPolicy {
    /// No quality sink upstream; every send fails.
    Ignore,
    /// Reports are accepted and otherwise ignored.
    Accept,
    /// Reports are accepted and acknowledged with the reported proportion,
    /// which sets the scheduler's throttle.
    Acknowledge,
}

/// The supplier end of the quality link.
#[derive(Debug)]
struct SupplierLink {
    policy: SupplierPolicy,
    last: Option<QualityMessage>,
}

impl QualitySink for SupplierLink {
    fn send(&mut self, message: &QualityMessage) -> Result<(), SendError> {
        self.last = Some(*message);
        match self.policy {
            SupplierPolicy::Ignore => Err(SendError::Disconnected),
            SupplierPolicy::Accept | SupplierPolicy::Acknowledge => Ok(()),
        }
    }
}

/// What happened to one simulated frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRecord {
    /// Frame index in the stream.
    pub index: i64,
    /// The sample handed to the scheduler.
    pub sample: Sample,
    /// When the frame reached the scheduler.
    pub arrival: StreamTime,
    /// The scheduler's decision.
    pub decision: Decision,
    /// When painting began, unless dropped.
    pub presented: Option<StreamTime>,
    /// Whether the supplier accepted the quality report.
    pub supplier_handling: bool,
    /// Proportion of the quality report for this frame.
    pub proportion: u16,
    /// Throttle slept after the paint (zero when dropped).
    pub throttle: Ticks,
}

impl FrameRecord {
    /// Signed distance from the nominal start to the paint, if drawn.
    #[must_use]
    pub fn sync_offset(&self) -> Option<Ticks> {
        self.presented.map(|at| at.since(self.sample.start))
    }
}

/// Plays a synthetic stream through a [`FrameScheduler`].
#[derive(Debug)]
pub struct Simulator<S> {
    scheduler: S,
    profile: StreamProfile,
    supplier: SupplierLink,
    stalls: Vec<Stall>,
    now: StreamTime,
    next_frame: i64,
    resync: bool,
}

impl<S: FrameScheduler> Simulator<S> {
    /// Creates a simulator at stream time zero, before frame zero.
    #[must_use]
    pub fn new(scheduler: S, profile: StreamProfile, policy: SupplierPolicy) -> Self {
        Self {
            scheduler,
            profile,
            supplier: SupplierLink { policy, last: None },
            stalls: Vec::new(),
            now: StreamTime::ZERO,
            next_frame: 0,
            resync: false,
        }
    }

    /// Adds a supplier stall.
    #[must_use]
    pub fn with_stall(mut self, stall: Stall) -> Self {
        self.stalls.push(stall);
        self
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> StreamTime {
        self.now
    }

    /// The driven scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Mutable access to the driven scheduler, e.g. to reset it.
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Delivers, schedules, and (unless dropped) paints the next frame.
    pub fn step(&mut self) -> FrameRecord {
        let profile = self.profile;

        let first_pending = self.next_frame;
        if core::mem::take(&mut self.resync) {
            while profile.start_of(self.next_frame).saturating_add(-profile.lead) < self.now {
                self.next_frame += 1;
            }
        }
        let skipped = self.next_frame != first_pending;
        let index = self.next_frame;
        self.next_frame += 1;

        if let Some(stall) = self.stalls.iter().find(|s| s.at_frame == index) {
            self.now = self.now.saturating_add(stall.length);
            self.resync = stall.skip_missed;
        }

        let start = profile.start_of(index);
        let mut sample = Sample::new(start, start.saturating_add(profile.frame_duration));
        if skipped {
            sample = sample.with_discontinuity();
        }
        self.now = self.now.max(start.saturating_add(-profile.lead));
        let arrival = self.now;

        let decision = self
            .scheduler
            .should_draw(&sample, arrival, &mut self.supplier);
        let supplier_handling = self.supplier.policy != SupplierPolicy::Ignore;
        let proportion = self.supplier.last.map_or(0, |m| m.proportion);
        if self.supplier.policy == SupplierPolicy::Acknowledge {
            _ = self.scheduler.notify(proportion);
        }

        let presented = match decision {
            Decision::Drop => None,
            Decision::DrawNow => Some(self.now),
            Decision::DrawAt(at) => Some(self.now.max(at)),
        };
        let mut throttle = 0;
        if let Some(at) = presented {
            let end = at.saturating_add(profile.paint_cost);
            let outcome = self.scheduler.record_render(RenderPath::Blitted {
                start: at.ticks(),
                end: end.ticks(),
            });
            throttle = outcome.throttle;
            self.now = end.saturating_add(throttle);
        }

        FrameRecord {
            index,
            sample,
            arrival,
            decision,
            presented,
            supplier_handling,
            proportion,
            throttle,
        }
    }

    /// Runs `frames` steps and returns their records.
    pub fn run(&mut self, frames: usize) -> Vec<FrameRecord> {
        (0..frames).map(|_| self.step()).collect()
    }
}
