//! Relay outputs for the red and green lamps.
//!
//! Both relay modules switch on when their input is pulled low, so every pin
//! starts high and the level written for a lamp comes from the polarity in
//! [`ALL_SIGNALS`].

use signal_core::controller::SignalDriver;
use signal_core::signals::{ALL_SIGNALS, LineLevel, SignalId, signal_by_id};

/// A single relay input pin.
pub trait RelayPin {
    fn drive(&mut self, level: LineLevel);
}

/// The two relay pins indexed by [`SignalId`].
pub struct RelayBank<P: RelayPin> {
    pins: [P; ALL_SIGNALS.len()],
}

impl<P: RelayPin> RelayBank<P> {
    /// Takes ownership of the relay pins; both should already rest at the off level.
    pub const fn new(red: P, green: P) -> Self {
        Self { pins: [red, green] }
    }

    #[cfg(test)]
    fn pin(&self, line: SignalId) -> &P {
        &self.pins[line.as_index()]
    }
}

impl<P: RelayPin> SignalDriver for RelayBank<P> {
    fn set(&mut self, line: SignalId, on: bool) {
        let level = signal_by_id(line).polarity.level_for(on);
        self.pins[line.as_index()].drive(level);
    }
}

#[cfg(target_os = "none")]
impl RelayPin for embassy_stm32::gpio::Output<'_> {
    fn drive(&mut self, level: LineLevel) {
        match level {
            LineLevel::High => self.set_high(),
            LineLevel::Low => self.set_low(),
        }
    }
}

/// Initial pin level that keeps a lamp dark.
pub const fn off_level(line: SignalId) -> LineLevel {
    signal_by_id(line).polarity.level_for(false)
}
