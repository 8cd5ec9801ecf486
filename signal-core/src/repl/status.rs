//! Status snapshot rendered by the `status` command.

use core::fmt;

use crate::controller::{AutoPhase, Controller, Mode, SignalDriver};
use crate::signals::OutputSignals;
use crate::timing::Milliseconds;

/// Point-in-time view of the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub now: Milliseconds,
    pub mode: Mode,
    pub phase: Option<AutoPhase>,
    pub outputs: OutputSignals,
    /// `true` while the debouncer holds a confirmed press.
    pub button_pressed: bool,
    /// Time until the automatic cycle next changes a lamp.
    pub next_change_in: Option<Milliseconds>,
}

impl StatusSnapshot {
    /// Captures the controller state as of `now`.
    #[must_use]
    pub fn capture<D: SignalDriver>(controller: &Controller<D>, now: Milliseconds) -> Self {
        let modes = controller.modes();
        Self {
            now,
            mode: modes.mode(),
            phase: modes.phase(),
            outputs: modes.outputs(),
            button_pressed: controller.debouncer().is_pressed(),
            next_change_in: modes.next_deadline(now),
        }
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={} mode={}", self.now, self.mode)?;
        if let Some(phase) = self.phase {
            write!(f, " phase={phase}")?;
        }
        write!(
            f,
            " {} button={}",
            self.outputs,
            if self.button_pressed { "held" } else { "idle" }
        )?;
        if let Some(remaining) = self.next_change_in {
            write!(f, " next-change-in={remaining}")?;
        }
        Ok(())
    }
}
