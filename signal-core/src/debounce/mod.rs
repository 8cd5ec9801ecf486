//! Time-based push-button debouncer.
//!
//! The debouncer is sampled once per poll loop. Any change of the raw level
//! restarts the settle window; once the level has been stable for the
//! configured delay and sits at the active polarity, exactly one
//! [`PressEvent`] is emitted. A latch keeps an extended hold from producing a
//! stream of events and is only cleared by the next raw level change.

use crate::signals::{ButtonPolarity, LineLevel};
use crate::timing::{DEBOUNCE_DELAY, Milliseconds};

/// A single debounced press of the mode button.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PressEvent {
    /// Poll timestamp at which the press was confirmed.
    pub at: Milliseconds,
}

/// Edge detector with a settle window and a per-activation latch.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Debouncer {
    polarity: ButtonPolarity,
    delay: Milliseconds,
    last_level: LineLevel,
    last_change_at: Milliseconds,
    consumed: bool,
}

impl Debouncer {
    /// Creates a debouncer that assumes the line starts idle.
    #[must_use]
    pub const fn new(polarity: ButtonPolarity, delay: Milliseconds) -> Self {
        Self {
            polarity,
            delay,
            last_level: polarity.idle_level(),
            last_change_at: Milliseconds::ZERO,
            consumed: false,
        }
    }

    /// Samples the raw line level and reports a freshly confirmed press.
    pub fn poll(&mut self, level: LineLevel, now: Milliseconds) -> Option<PressEvent> {
        if level != self.last_level {
            self.last_level = level;
            self.last_change_at = now;
            self.consumed = false;
        }

        if self.consumed
            || !self.polarity.is_active(level)
            || !now.has_elapsed(self.last_change_at, self.delay)
        {
            return None;
        }

        self.consumed = true;
        Some(PressEvent { at: now })
    }

    /// Returns `true` while a press has been confirmed and the line has not moved since.
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.consumed && self.polarity.is_active(self.last_level)
    }

    /// Last raw level observed by [`Debouncer::poll`].
    #[must_use]
    pub const fn last_level(&self) -> LineLevel {
        self.last_level
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(ButtonPolarity::ActiveLow, DEBOUNCE_DELAY)
    }
}
