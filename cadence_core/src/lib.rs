// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presentation-timing core for video renderers.
//!
//! `cadence_core` decides, frame by frame, whether a decoded video frame is
//! drawn immediately, drawn at its scheduled moment, or dropped, and reports
//! quality feedback upstream so the frame supplier can adjust its own rate.
//! It is `no_std` compatible and allocation-free in the steady state: every
//! window and ring is a const-capacity array.
//!
//! # Architecture
//!
//! ```text
//!   Supplier ──► Sample ──► Scheduler::decide() ──► Decision
//!      ▲                          │                    │
//!      │                          ▼                    ▼
//!      └──── QualitySink ◄── QualityMessage      paint (external)
//!      │                                               │
//!      │                 ┌─────────────────────────────┘
//!      │                 ▼
//!      │   RenderPath ──► Scheduler::record_render() ──► throttle sleep
//!      │
//!      └──── notify(proportion) ──► Scheduler::notify()
//! ```
//!
//! **[`time`]**: 100 ns [`Ticks`](time::Ticks) and the
//! [`StreamTime`](time::StreamTime) axis.
//!
//! **[`ring`]**: Const-capacity timestamp ring with rolling average-interval
//! queries.
//!
//! **[`average`]**: Fixed-window moving average and the integer EMA used by
//! the scheduler.
//!
//! **[`stats`]**: Arrival and draw trackers plus cumulative sync-offset and
//! jitter statistics.
//!
//! **[`quality`]**: Quality messages, the [`QualitySink`](quality::QualitySink)
//! trait, and the acknowledgement → throttle mapping.
//!
//! **[`scheduler`]**: The decision engine and render-time bookkeeping.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! presentation-loop instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

#[cfg(test)]
extern crate alloc;

pub mod average;
pub mod quality;
pub mod ring;
pub mod scheduler;
pub mod stats;
pub mod time;
pub mod trace;
