//! Millisecond clock arithmetic and the controller's timing windows.
//!
//! Every deadline in the controller is measured on a free-running 32-bit
//! millisecond counter. The counter wraps roughly every 49.7 days, so elapsed
//! time is always computed with modular subtraction and never by comparing
//! raw timestamps.

use core::fmt;

/// Point on (or span of) the wrapping millisecond clock.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Milliseconds(u32);

impl Milliseconds {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Wrap-safe elapsed time from `earlier` to `self`.
    ///
    /// Correct across a counter rollover as long as the real interval is
    /// shorter than one full wrap period.
    #[must_use]
    pub const fn elapsed_since(self, earlier: Self) -> Self {
        Self(self.0.wrapping_sub(earlier.0))
    }

    /// Returns `true` once at least `window` has passed since `start`.
    #[must_use]
    pub const fn has_elapsed(self, start: Self, window: Self) -> bool {
        self.elapsed_since(start).0 >= window.0
    }

    /// Advances the clock, wrapping at `u32::MAX`.
    #[must_use]
    pub const fn wrapping_add(self, delta: Self) -> Self {
        Self(self.0.wrapping_add(delta.0))
    }

    /// Saturating difference between two spans.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Truncates a 64-bit millisecond count onto the wrapping clock.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_u64_wrapping(value: u64) -> Self {
        Self(value as u32)
    }
}

impl fmt::Display for Milliseconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Minimum time the button level must stay unchanged before it is trusted.
pub const DEBOUNCE_DELAY: Milliseconds = Milliseconds::new(50);
/// Period between green flips while blinking.
pub const BLINK_INTERVAL: Milliseconds = Milliseconds::new(1_000);
/// How long the automatic cycle holds red.
pub const RED_DURATION: Milliseconds = Milliseconds::new(3_000);
/// How long the automatic cycle blinks green before returning to red.
pub const GREEN_BLINK_DURATION: Milliseconds = Milliseconds::new(6_000);

/// Timing windows consumed by the debouncer and the mode controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimingConfig {
    pub debounce: Milliseconds,
    pub blink_interval: Milliseconds,
    pub red_hold: Milliseconds,
    pub green_blink: Milliseconds,
}

impl TimingConfig {
    /// The production timing windows.
    pub const STANDARD: Self = Self::new(
        DEBOUNCE_DELAY,
        BLINK_INTERVAL,
        RED_DURATION,
        GREEN_BLINK_DURATION,
    );

    #[must_use]
    pub const fn new(
        debounce: Milliseconds,
        blink_interval: Milliseconds,
        red_hold: Milliseconds,
        green_blink: Milliseconds,
    ) -> Self {
        Self {
            debounce,
            blink_interval,
            red_hold,
            green_blink,
        }
    }

    /// Length of one full red-hold plus green-blink round, wrapping like the clock.
    #[must_use]
    pub const fn auto_cycle_period(&self) -> Milliseconds {
        self.red_hold.wrapping_add(self.green_blink)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_survives_counter_rollover() {
        let start = Milliseconds::new(u32::MAX - 9);
        let now = Milliseconds::new(40);
        assert_eq!(now.elapsed_since(start), Milliseconds::new(50));
        assert!(now.has_elapsed(start, DEBOUNCE_DELAY));
        assert!(!Milliseconds::new(39).has_elapsed(start, DEBOUNCE_DELAY));
    }

    #[test]
    fn wrapping_add_rolls_over() {
        let near_end = Milliseconds::new(u32::MAX);
        assert_eq!(
            near_end.wrapping_add(Milliseconds::new(2)),
            Milliseconds::new(1)
        );
    }

    #[test]
    fn truncates_wide_counters() {
        let wide = u64::from(u32::MAX) + 6;
        assert_eq!(Milliseconds::from_u64_wrapping(wide), Milliseconds::new(5));
    }

    #[test]
    fn standard_timing_matches_cycle_period() {
        let config = TimingConfig::default();
        assert_eq!(config, TimingConfig::STANDARD);
        assert_eq!(config.debounce, Milliseconds::new(50));
        assert_eq!(config.auto_cycle_period(), Milliseconds::new(9_000));
    }

    #[test]
    fn cycle_period_wraps_instead_of_overflowing() {
        let config = TimingConfig::new(
            DEBOUNCE_DELAY,
            BLINK_INTERVAL,
            Milliseconds::new(u32::MAX),
            Milliseconds::new(2),
        );
        assert_eq!(config.auto_cycle_period(), Milliseconds::new(1));
    }
}
