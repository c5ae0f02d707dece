//! Debouncing of "no frame" evaluations.
//!
//! When video stops the engine eventually falls back to a neutral
//! configuration, but not on the first missing frame: a gap of a few
//! vsyncs between clips must not flip the sink out of HDR and back.

use csc_core::ChangeState;
use tracing::trace;

/// What a "no frame" tick should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdleAction {
    /// Keep the current configuration.
    Hold,
    /// Evaluate the idle fallback and emit it unconditionally.
    Fallback,
}

/// Changes that re-arm the counter.
const REARM: ChangeState = ChangeState::SINK_SUPPORT
    .union(ChangeState::OUTPUT_FORMAT)
    .union(ChangeState::WHITE_BALANCE);

/// Counter of consecutive "no frame" evaluations.
#[derive(Debug, Clone, Default)]
pub struct Hysteresis {
    idle_ticks: u32,
}

impl Hysteresis {
    /// Fresh controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consecutive idle ticks seen so far.
    pub fn idle_ticks(&self) -> u32 {
        self.idle_ticks
    }

    /// A real or repeated frame arrived.
    pub fn reset(&mut self) {
        self.idle_ticks = 0;
    }

    /// Accounts one "no frame" tick.
    ///
    /// `changes` are the environment changes observed on this tick. Sink,
    /// output format and white balance changes re-arm the countdown so
    /// that a renegotiating sink settles before the fallback. An SDR
    /// policy change fires on this tick. Otherwise the fallback fires
    /// exactly once, on the tick that reaches `threshold`.
    pub fn tick(&mut self, changes: ChangeState, threshold: u32) -> IdleAction {
        let threshold = threshold.max(1);
        if changes.intersects(REARM) {
            self.idle_ticks = 0;
        }
        if changes.contains(ChangeState::SDR_MODE) {
            self.idle_ticks = threshold - 1;
        }
        if self.idle_ticks <= threshold {
            self.idle_ticks += 1;
        }
        trace!(idle_ticks = self.idle_ticks, threshold, "no frame");
        if self.idle_ticks == threshold {
            IdleAction::Fallback
        } else {
            IdleAction::Hold
        }
    }
}
