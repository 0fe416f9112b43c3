// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Precondition failures reported by the renderer.

use core::fmt;

/// Why a sample could not be scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    /// No stream clock is attached to the renderer.
    NoClock,
    /// A clock is attached but cannot report the stream time (stopped or
    /// not yet started).
    ClockUnavailable,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoClock => f.write_str("no stream clock attached"),
            Self::ClockUnavailable => f.write_str("stream clock is not running"),
        }
    }
}

impl core::error::Error for ScheduleError {}
