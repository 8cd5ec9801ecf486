//! Mode and automatic-cycle state machine.
//!
//! [`ModeController`] owns the operator-selected [`Mode`] and, while in
//! [`Mode::Auto`], the nested red-hold / green-blink cycle. It never blocks:
//! each call to [`ModeController::tick`] compares the wrapping millisecond
//! clock against the stored phase timestamps and returns the lamp states for
//! that instant. [`Controller`] glues the debouncer, the state machine, and a
//! [`SignalDriver`] into the single poll step the firmware and emulator loops
//! run.

use core::fmt;

use crate::debounce::{Debouncer, PressEvent};
use crate::signals::{BUTTON_LINE, LineLevel, OutputSignals, SignalId};
use crate::telemetry::{TelemetryEventKind, TelemetrySink};
use crate::timing::{Milliseconds, TimingConfig};

/// Operator-selectable operating mode.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Mode {
    /// Both lamps dark.
    #[default]
    Off,
    /// Red lamp steady.
    Red,
    /// Green lamp steady.
    Green,
    /// Timed red-hold / green-blink cycle.
    Auto,
}

impl Mode {
    /// Every mode in button order, starting from power-up.
    pub const CYCLE: [Mode; 4] = [Mode::Off, Mode::Red, Mode::Green, Mode::Auto];

    /// Mode selected by the next button press.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Mode::Off => Mode::Red,
            Mode::Red => Mode::Green,
            Mode::Green => Mode::Auto,
            Mode::Auto => Mode::Off,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Mode::Off => "1. all off",
            Mode::Red => "2. red lit",
            Mode::Green => "3. green lit",
            Mode::Auto => "4. automatic cycle",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Off => "off",
            Mode::Red => "red",
            Mode::Green => "green",
            Mode::Auto => "auto",
        })
    }
}

/// Phase of the automatic cycle.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum AutoPhase {
    /// Red held steady for the red-hold window.
    #[default]
    RedHold,
    /// Green flipping every blink interval for the blink window.
    GreenBlink,
}

impl AutoPhase {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            AutoPhase::RedHold => "red 3 s",
            AutoPhase::GreenBlink => "green blinking 6 s",
        }
    }
}

impl fmt::Display for AutoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AutoPhase::RedHold => "red-hold",
            AutoPhase::GreenBlink => "green-blink",
        })
    }
}

/// Abstraction over the physical lamp drivers.
pub trait SignalDriver {
    /// Drives one lamp on or off.
    fn set(&mut self, line: SignalId, on: bool);

    /// Turns every lamp off.
    fn release_all(&mut self) {
        self.set(SignalId::Red, false);
        self.set(SignalId::Green, false);
    }

    /// Writes both lamps from a computed tick result.
    fn apply(&mut self, outputs: OutputSignals) {
        self.set(SignalId::Red, outputs.red);
        self.set(SignalId::Green, outputs.green);
    }
}

/// Lamp driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSignalDriver;

impl NoopSignalDriver {
    /// Creates a new no-op lamp driver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SignalDriver for NoopSignalDriver {
    fn set(&mut self, _: SignalId, _: bool) {}
}

/// Top-level mode plus the automatic-cycle sub-state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ModeController {
    timing: TimingConfig,
    mode: Mode,
    phase: AutoPhase,
    phase_entered_at: Milliseconds,
    last_blink_toggle_at: Milliseconds,
    blink_on: bool,
    outputs: OutputSignals,
}

impl ModeController {
    /// Creates a controller in [`Mode::Off`].
    #[must_use]
    pub const fn new(timing: TimingConfig) -> Self {
        Self {
            timing,
            mode: Mode::Off,
            phase: AutoPhase::RedHold,
            phase_entered_at: Milliseconds::ZERO,
            last_blink_toggle_at: Milliseconds::ZERO,
            blink_on: false,
            outputs: OutputSignals::OFF,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Current automatic phase, or `None` outside [`Mode::Auto`].
    #[must_use]
    pub const fn phase(&self) -> Option<AutoPhase> {
        match self.mode {
            Mode::Auto => Some(self.phase),
            Mode::Off | Mode::Red | Mode::Green => None,
        }
    }

    /// Lamp states produced by the most recent press or tick.
    #[must_use]
    pub const fn outputs(&self) -> OutputSignals {
        self.outputs
    }

    #[must_use]
    pub const fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Advances to the next mode and restarts the automatic cycle.
    ///
    /// Returns the transient all-off state the caller should write before the
    /// next [`ModeController::tick`] computes the real outputs.
    pub fn on_press_event<S>(&mut self, now: Milliseconds, telemetry: &mut S) -> OutputSignals
    where
        S: TelemetrySink + ?Sized,
    {
        self.mode = self.mode.next();
        self.phase = AutoPhase::RedHold;
        self.phase_entered_at = now;
        self.last_blink_toggle_at = now;
        self.blink_on = false;
        self.outputs = OutputSignals::OFF;

        telemetry.record(TelemetryEventKind::ModeChanged(self.mode), now);
        self.outputs
    }

    /// Computes the lamp states for `now`, advancing the automatic cycle if due.
    pub fn tick<S>(&mut self, now: Milliseconds, telemetry: &mut S) -> OutputSignals
    where
        S: TelemetrySink + ?Sized,
    {
        self.outputs = match self.mode {
            Mode::Off => OutputSignals::OFF,
            Mode::Red => OutputSignals::RED,
            Mode::Green => OutputSignals::GREEN,
            Mode::Auto => self.tick_auto(now, telemetry),
        };
        self.outputs
    }

    /// Time left until the automatic cycle next changes a lamp.
    #[must_use]
    pub fn next_deadline(&self, now: Milliseconds) -> Option<Milliseconds> {
        let remaining = |start: Milliseconds, window: Milliseconds| {
            window.saturating_sub(now.elapsed_since(start))
        };

        match self.phase()? {
            AutoPhase::RedHold => Some(remaining(self.phase_entered_at, self.timing.red_hold)),
            AutoPhase::GreenBlink => {
                let phase_end = remaining(self.phase_entered_at, self.timing.green_blink);
                let toggle = remaining(self.last_blink_toggle_at, self.timing.blink_interval);
                Some(if toggle.as_u32() < phase_end.as_u32() {
                    toggle
                } else {
                    phase_end
                })
            }
        }
    }

    fn tick_auto<S>(&mut self, now: Milliseconds, telemetry: &mut S) -> OutputSignals
    where
        S: TelemetrySink + ?Sized,
    {
        match self.phase {
            AutoPhase::RedHold => {
                if now.has_elapsed(self.phase_entered_at, self.timing.red_hold) {
                    self.enter_phase(AutoPhase::GreenBlink, now, telemetry);
                    self.blink_on = true;
                    OutputSignals::GREEN
                } else {
                    OutputSignals::RED
                }
            }
            AutoPhase::GreenBlink => {
                // Phase expiry wins over a blink toggle due on the same tick.
                if now.has_elapsed(self.phase_entered_at, self.timing.green_blink) {
                    self.blink_on = false;
                    self.enter_phase(AutoPhase::RedHold, now, telemetry);
                    return OutputSignals::OFF;
                }

                if now.has_elapsed(self.last_blink_toggle_at, self.timing.blink_interval) {
                    self.blink_on = !self.blink_on;
                    self.last_blink_toggle_at = now;
                    telemetry.record(TelemetryEventKind::BlinkToggled(self.blink_on), now);
                }
                OutputSignals::new(false, self.blink_on)
            }
        }
    }

    fn enter_phase<S>(&mut self, phase: AutoPhase, now: Milliseconds, telemetry: &mut S)
    where
        S: TelemetrySink + ?Sized,
    {
        self.phase = phase;
        self.phase_entered_at = now;
        self.last_blink_toggle_at = now;
        telemetry.record(TelemetryEventKind::PhaseChanged(phase), now);
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(TimingConfig::STANDARD)
    }
}

/// One debouncer, one mode state machine, and the lamps they drive.
pub struct Controller<D: SignalDriver = NoopSignalDriver> {
    debouncer: Debouncer,
    modes: ModeController,
    driver: D,
}

impl Controller {
    /// Creates a controller with the standard timing and no hardware attached.
    #[must_use]
    pub const fn detached() -> Self {
        Controller::new(NoopSignalDriver::new(), TimingConfig::STANDARD)
    }
}

impl<D: SignalDriver> Controller<D> {
    /// Creates a controller for the board's mode button and the supplied lamps.
    pub const fn new(driver: D, timing: TimingConfig) -> Self {
        Self {
            debouncer: Debouncer::new(BUTTON_LINE.polarity, timing.debounce),
            modes: ModeController::new(timing),
            driver,
        }
    }

    /// Darkens both lamps and announces the controller.
    pub fn start<S>(&mut self, now: Milliseconds, telemetry: &mut S)
    where
        S: TelemetrySink + ?Sized,
    {
        self.driver.release_all();
        telemetry.record(TelemetryEventKind::Startup, now);
    }

    /// Runs one iteration of the polling loop.
    ///
    /// The button is debounced first; a confirmed press advances the mode and
    /// blanks both lamps immediately. The lamps are then rewritten from the
    /// current state on every call, whether or not anything changed.
    pub fn poll<S>(&mut self, level: LineLevel, now: Milliseconds, telemetry: &mut S) -> OutputSignals
    where
        S: TelemetrySink + ?Sized,
    {
        if let Some(PressEvent { at }) = self.debouncer.poll(level, now) {
            let blank = self.modes.on_press_event(at, telemetry);
            self.driver.apply(blank);
        }

        let outputs = self.modes.tick(now, telemetry);
        self.driver.apply(outputs);
        outputs
    }

    #[must_use]
    pub const fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    #[must_use]
    pub const fn modes(&self) -> &ModeController {
        &self.modes
    }

    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{NoopTelemetry, TelemetryLog};
    use heapless::Vec as HeaplessVec;

    fn ms(value: u32) -> Milliseconds {
        Milliseconds::new(value)
    }

    #[derive(Default)]
    struct RecordingDriver {
        writes: HeaplessVec<(SignalId, bool), 64>,
    }

    impl SignalDriver for RecordingDriver {
        fn set(&mut self, line: SignalId, on: bool) {
            self.writes.push((line, on)).expect("driver log full");
        }
    }

    fn auto_at(now: Milliseconds) -> ModeController {
        let mut modes = ModeController::default();
        for _ in 0..3 {
            modes.on_press_event(now, &mut NoopTelemetry);
        }
        assert_eq!(modes.mode(), Mode::Auto);
        modes
    }

    #[test]
    fn next_mode_closes_the_cycle() {
        for (index, mode) in Mode::CYCLE.iter().enumerate() {
            assert_eq!(mode.next(), Mode::CYCLE[(index + 1) % Mode::CYCLE.len()]);
        }
    }

    #[test]
    fn press_blanks_outputs_and_announces_mode() {
        let mut modes = ModeController::default();
        let mut log = TelemetryLog::<8>::new();

        assert_eq!(modes.tick(ms(0), &mut log), OutputSignals::OFF);
        assert_eq!(modes.on_press_event(ms(10), &mut log), OutputSignals::OFF);
        assert_eq!(modes.mode(), Mode::Red);
        assert_eq!(
            log.latest().map(|record| record.event),
            Some(TelemetryEventKind::ModeChanged(Mode::Red))
        );
        assert_eq!(modes.tick(ms(10), &mut log), OutputSignals::RED);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn steady_modes_ignore_time() {
        let mut modes = ModeController::default();
        modes.on_press_event(ms(0), &mut NoopTelemetry);
        modes.on_press_event(ms(0), &mut NoopTelemetry);
        assert_eq!(modes.mode(), Mode::Green);
        for t in [0, 3_000, 9_000, 60_000] {
            assert_eq!(modes.tick(ms(t), &mut NoopTelemetry), OutputSignals::GREEN);
        }
        assert_eq!(modes.phase(), None);
        assert_eq!(modes.next_deadline(ms(0)), None);
    }

    #[test]
    fn red_hold_hands_over_to_green_blink() {
        let mut modes = auto_at(ms(0));
        let mut log = TelemetryLog::<8>::new();

        assert_eq!(modes.tick(ms(0), &mut log), OutputSignals::RED);
        assert_eq!(modes.tick(ms(2_999), &mut log), OutputSignals::RED);
        assert_eq!(modes.next_deadline(ms(2_999)), Some(ms(1)));
        assert!(log.is_empty());

        assert_eq!(modes.tick(ms(3_000), &mut log), OutputSignals::GREEN);
        assert_eq!(modes.phase(), Some(AutoPhase::GreenBlink));
        assert_eq!(
            log.latest().map(|record| record.event),
            Some(TelemetryEventKind::PhaseChanged(AutoPhase::GreenBlink))
        );
    }

    #[test]
    fn green_blink_expiry_beats_the_blink_toggle() {
        let mut modes = auto_at(ms(0));
        let mut log = TelemetryLog::<16>::new();

        for t in (0..=9_000).step_by(500) {
            modes.tick(ms(t), &mut log);
        }

        assert_eq!(modes.phase(), Some(AutoPhase::RedHold));
        assert_eq!(modes.outputs(), OutputSignals::OFF);
        assert_eq!(
            log.count_matching(|event| matches!(event, TelemetryEventKind::BlinkToggled(_))),
            5
        );
        assert_eq!(
            log.latest().map(|record| record.event),
            Some(TelemetryEventKind::PhaseChanged(AutoPhase::RedHold))
        );
        assert_eq!(modes.tick(ms(9_001), &mut log), OutputSignals::RED);
    }

    #[test]
    fn repeated_ticks_at_one_instant_are_idempotent() {
        let mut modes = auto_at(ms(0));
        let mut log = TelemetryLog::<8>::new();
        modes.tick(ms(3_000), &mut log);

        let first = modes.tick(ms(4_000), &mut log);
        let recorded = log.len();
        let second = modes.tick(ms(4_000), &mut log);
        assert_eq!(first, OutputSignals::OFF);
        assert_eq!(first, second);
        assert_eq!(log.len(), recorded);
    }

    #[test]
    fn blink_deadline_reports_nearest_threshold() {
        let mut modes = auto_at(ms(0));
        modes.tick(ms(3_000), &mut NoopTelemetry);
        assert_eq!(modes.next_deadline(ms(3_250)), Some(ms(750)));
        modes.tick(ms(8_000), &mut NoopTelemetry);
        assert_eq!(modes.next_deadline(ms(8_600)), Some(ms(400)));
    }

    #[test]
    fn controller_blanks_lamps_before_rewriting_them() {
        let mut controller = Controller::new(RecordingDriver::default(), TimingConfig::STANDARD);
        let mut log = TelemetryLog::<8>::new();
        controller.start(ms(0), &mut log);
        assert_eq!(log.latest().map(|record| record.event), Some(TelemetryEventKind::Startup));

        controller.poll(LineLevel::Low, ms(10), &mut log);
        controller.driver_mut().writes.clear();

        let outputs = controller.poll(LineLevel::Low, ms(60), &mut log);
        assert_eq!(outputs, OutputSignals::RED);
        assert_eq!(
            controller.driver().writes.as_slice(),
            &[
                (SignalId::Red, false),
                (SignalId::Green, false),
                (SignalId::Red, true),
                (SignalId::Green, false),
            ]
        );
    }

    #[test]
    fn controller_rewrites_lamps_every_poll() {
        let mut controller = Controller::new(RecordingDriver::default(), TimingConfig::STANDARD);
        for t in 0..4 {
            controller.poll(LineLevel::High, ms(t), &mut NoopTelemetry);
        }
        assert_eq!(controller.driver().writes.len(), 8);
        assert!(controller.driver().writes.iter().all(|(_, on)| !on));
    }
}
