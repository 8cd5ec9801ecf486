//! Signal line catalog shared by firmware and host targets.
//!
//! Describes the two lamp outputs and the push-button input the controller
//! drives, including how each line is wired. Nothing in here touches hardware;
//! the firmware maps these identifiers onto concrete pins and the emulator
//! keeps them as simulated lamps.

use core::fmt;

/// Identifier for the lamp outputs exposed by the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignalId {
    Red,
    Green,
}

impl SignalId {
    /// Deterministic index for lookups into [`ALL_SIGNALS`].
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            SignalId::Red => 0,
            SignalId::Green => 1,
        }
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(signal_by_id(*self).name)
    }
}

/// Electrical level of a digital line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineLevel {
    Low,
    High,
}

impl LineLevel {
    #[must_use]
    pub const fn from_high(high: bool) -> Self {
        if high { LineLevel::High } else { LineLevel::Low }
    }

    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, LineLevel::High)
    }
}

/// Which output level energizes a lamp.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignalPolarity {
    ActiveLow,
    ActiveHigh,
}

impl SignalPolarity {
    /// Pin level that produces the requested lamp state.
    #[must_use]
    pub const fn level_for(self, on: bool) -> LineLevel {
        match (self, on) {
            (SignalPolarity::ActiveLow, true) | (SignalPolarity::ActiveHigh, false) => {
                LineLevel::Low
            }
            (SignalPolarity::ActiveLow, false) | (SignalPolarity::ActiveHigh, true) => {
                LineLevel::High
            }
        }
    }
}

/// Which input level counts as the button being held.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ButtonPolarity {
    /// Pull-up input, idle high, closed switch pulls the line low.
    #[default]
    ActiveLow,
    ActiveHigh,
}

impl ButtonPolarity {
    #[must_use]
    pub const fn is_active(self, level: LineLevel) -> bool {
        matches!(
            (self, level),
            (ButtonPolarity::ActiveLow, LineLevel::Low)
                | (ButtonPolarity::ActiveHigh, LineLevel::High)
        )
    }

    /// Level the line rests at while the button is released.
    #[must_use]
    pub const fn idle_level(self) -> LineLevel {
        match self {
            ButtonPolarity::ActiveLow => LineLevel::High,
            ButtonPolarity::ActiveHigh => LineLevel::Low,
        }
    }

    /// Level the line is driven to while the button is held.
    #[must_use]
    pub const fn active_level(self) -> LineLevel {
        match self {
            ButtonPolarity::ActiveLow => LineLevel::Low,
            ButtonPolarity::ActiveHigh => LineLevel::High,
        }
    }
}

/// Metadata describing how a lamp output is routed on the board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SignalLine {
    pub id: SignalId,
    pub name: &'static str,
    pub mcu_pin: &'static str,
    pub relay_channel: &'static str,
    pub polarity: SignalPolarity,
}

impl SignalLine {
    #[must_use]
    pub const fn new(
        id: SignalId,
        name: &'static str,
        mcu_pin: &'static str,
        relay_channel: &'static str,
        polarity: SignalPolarity,
    ) -> Self {
        Self {
            id,
            name,
            mcu_pin,
            relay_channel,
            polarity,
        }
    }
}

/// Compile-time catalog of every lamp output.
pub const ALL_SIGNALS: [SignalLine; 2] = [
    SignalLine::new(
        SignalId::Red,
        "RED",
        "PA6",
        "K1",
        SignalPolarity::ActiveLow,
    ),
    SignalLine::new(
        SignalId::Green,
        "GREEN",
        "PA7",
        "K2",
        SignalPolarity::ActiveLow,
    ),
];

/// Retrieve lamp metadata by identifier.
#[must_use]
pub const fn signal_by_id(id: SignalId) -> SignalLine {
    ALL_SIGNALS[id.as_index()]
}

/// Metadata for the mode-select push button.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ButtonLine {
    pub name: &'static str,
    pub mcu_pin: &'static str,
    pub polarity: ButtonPolarity,
}

/// The single operator button, wired to ground with the internal pull-up enabled.
pub const BUTTON_LINE: ButtonLine = ButtonLine {
    name: "MODE",
    mcu_pin: "PB2",
    polarity: ButtonPolarity::ActiveLow,
};

/// Lamp states the controller wants asserted during one tick.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct OutputSignals {
    pub red: bool,
    pub green: bool,
}

impl OutputSignals {
    pub const OFF: Self = Self::new(false, false);
    pub const RED: Self = Self::new(true, false);
    pub const GREEN: Self = Self::new(false, true);

    #[must_use]
    pub const fn new(red: bool, green: bool) -> Self {
        Self { red, green }
    }

    /// Requested state for a single lamp.
    #[must_use]
    pub const fn get(self, id: SignalId) -> bool {
        match id {
            SignalId::Red => self.red,
            SignalId::Green => self.green,
        }
    }

    /// Red and green are never lit together.
    #[must_use]
    pub const fn is_exclusive(self) -> bool {
        !(self.red && self.green)
    }
}

impl fmt::Display for OutputSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = |on: bool| if on { "on" } else { "off" };
        write!(f, "red={} green={}", label(self.red), label(self.green))
    }
}
