// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thread-safe renderer integration for `cadence_core`.
//!
//! `cadence_render` wraps the [`Scheduler`](cadence_core::scheduler::Scheduler)
//! in a [`Renderer`](renderer::Renderer) that can be shared between a
//! streaming thread and a presentation thread:
//!
//! ```text
//!   streaming thread                 presentation thread
//!   ────────────────                 ───────────────────
//!   should_draw(sample) ──┐     ┌── on_render_start()
//!                         ▼     ▼
//!                   Mutex<Scheduler + QualityRoute>
//!                         ▲     ▲
//!   notify(proportion) ───┘     └── on_render_end() / on_direct_render()
//!                                   (throttle sleep under the lock)
//! ```
//!
//! **[`clock`]**: The [`StreamClock`](clock::StreamClock) trait with a
//! wall-clock and a manually driven implementation.
//!
//! **[`route`]**: [`QualityRoute`](route::QualityRoute): override sink or
//! lazily queried upstream peer.
//!
//! **[`renderer`]**: The [`Renderer`](renderer::Renderer) front end.
//!
//! **[`error`]**: [`ScheduleError`](error::ScheduleError) precondition
//! failures.
//!
//! Diagnostics go through the `tracing` crate (`debug` for drops and quality
//! delivery changes, `trace` per decision, `info` for resets) and, with the
//! `trace` feature, through a [`TraceSink`](cadence_core::trace::TraceSink).
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Forwards `cadence_core/trace`.

pub mod clock;
pub mod error;
pub mod renderer;
pub mod route;

pub use clock::{ManualClock, MonotonicClock, StreamClock};
pub use error::ScheduleError;
pub use renderer::Renderer;
pub use route::{BoxedQualitySink, QualityRoute, UpstreamPeer};
