use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use signal_core::controller::{Controller, SignalDriver};
use signal_core::repl::grammar::{self, Command};
use signal_core::repl::status::StatusSnapshot;
use signal_core::signals::{ALL_SIGNALS, BUTTON_LINE, LineLevel, OutputSignals, SignalId};
use signal_core::telemetry::{EventId, TelemetryEventKind, TelemetryLog, TelemetrySink};
use signal_core::timing::{Milliseconds, TimingConfig};

/// Hold time used by `tap` when no duration is given.
pub const DEFAULT_TAP_HOLD: Milliseconds = Milliseconds::new(100);
/// Idle time `tap` runs after releasing the button.
pub const TAP_SETTLE: Milliseconds = Milliseconds::new(100);
const DEFAULT_HISTORY_COUNT: usize = 8;

pub const DEFAULT_TRANSCRIPT_PATH: &str = "transcripts/emulator.log";

pub const HELP_TOPICS: &[(&str, &str)] = &[
    ("press", "press                 - drive the MODE button active and hold it"),
    ("release", "release               - return the MODE button to idle"),
    (
        "tap",
        "tap [hold]            - press, hold (default 100ms), release, settle 100ms",
    ),
    (
        "wait",
        "wait <duration>       - advance the simulated clock (e.g. 250ms, 3s)",
    ),
    ("status", "status                - show mode, phase, lamps and relay pins"),
    ("history", "history [count]       - show recent controller notifications"),
    ("help", "help [topic]          - show help for a command"),
    ("exit", "exit | quit           - close the session"),
];

/// Runtime knobs chosen on the command line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionConfig {
    /// Simulated time between two controller polls.
    pub poll_period: Milliseconds,
    pub transcript_path: PathBuf,
    pub timing: TimingConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_period: Milliseconds::new(1),
            transcript_path: PathBuf::from(DEFAULT_TRANSCRIPT_PATH),
            timing: TimingConfig::STANDARD,
        }
    }
}

/// Lamp driver that remembers the last level written to each relay.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SimulatedLamps {
    lit: [bool; ALL_SIGNALS.len()],
    writes: u64,
}

impl SimulatedLamps {
    pub fn outputs(&self) -> OutputSignals {
        OutputSignals::new(
            self.lit[SignalId::Red.as_index()],
            self.lit[SignalId::Green.as_index()],
        )
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl SignalDriver for SimulatedLamps {
    fn set(&mut self, line: SignalId, on: bool) {
        self.lit[line.as_index()] = on;
        self.writes += 1;
    }
}

/// Telemetry sink that keeps history and reports records not yet displayed.
///
/// Fresh records are read back out of the bounded ring, so a long `wait`
/// reports only the newest ones plus a count of those that rolled off.
#[derive(Default)]
struct SessionTelemetry {
    log: TelemetryLog,
    next_unread: EventId,
}

impl SessionTelemetry {
    fn drain(&mut self) -> Vec<String> {
        let total = self.log.total_recorded();
        let unread = total.wrapping_sub(self.next_unread);
        let first_unread = self.next_unread;
        let mut lines = Vec::new();
        for record in self.log.oldest_first() {
            if record.id.wrapping_sub(first_unread) < unread {
                lines.push(record.to_string());
            }
        }
        self.next_unread = total;

        let shown = EventId::try_from(lines.len()).unwrap_or(EventId::MAX);
        let omitted = unread.saturating_sub(shown);
        if omitted > 0 {
            lines.insert(0, format!("... {omitted} earlier notifications omitted"));
        }
        lines
    }
}

impl TelemetrySink for SessionTelemetry {
    fn record(&mut self, event: TelemetryEventKind, timestamp: Milliseconds) {
        self.log.record(event, timestamp);
    }
}

pub struct Session {
    controller: Controller<SimulatedLamps>,
    telemetry: SessionTelemetry,
    transcript: TranscriptLogger,
    poll_period: Milliseconds,
    now: Milliseconds,
    button: LineLevel,
}

impl Session {
    pub fn new(config: &SessionConfig) -> io::Result<Self> {
        if config.poll_period == Milliseconds::ZERO {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "poll period must be at least 1ms",
            ));
        }

        let transcript = TranscriptLogger::new(&config.transcript_path)?;
        let mut session = Self {
            controller: Controller::new(SimulatedLamps::default(), config.timing),
            telemetry: SessionTelemetry::default(),
            transcript,
            poll_period: config.poll_period,
            now: Milliseconds::ZERO,
            button: BUTTON_LINE.polarity.idle_level(),
        };

        session.controller.start(session.now, &mut session.telemetry);
        session.poll_once();
        Ok(session)
    }

    /// Notifications produced before the first command, such as the startup banner.
    pub fn take_notifications(&mut self) -> io::Result<Vec<String>> {
        let lines = self.telemetry.drain();
        self.record_output(&lines)?;
        Ok(lines)
    }

    pub fn outputs(&self) -> OutputSignals {
        self.controller.driver().outputs()
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        self.transcript
            .append_line(self.now, TranscriptRole::Host, trimmed)?;

        let mut lines = match grammar::parse(trimmed) {
            Ok(Command::Press) => {
                self.set_button(BUTTON_LINE.polarity.active_level());
                vec![self.lamp_summary("OK button held")]
            }
            Ok(Command::Release) => {
                self.set_button(BUTTON_LINE.polarity.idle_level());
                vec![self.lamp_summary("OK button released")]
            }
            Ok(Command::Tap(hold)) => {
                let hold = hold.unwrap_or(DEFAULT_TAP_HOLD);
                self.set_button(BUTTON_LINE.polarity.active_level());
                self.run_for(hold);
                self.set_button(BUTTON_LINE.polarity.idle_level());
                self.run_for(TAP_SETTLE);
                vec![self.lamp_summary(&format!("OK tap hold={hold}"))]
            }
            Ok(Command::Wait(span)) => {
                self.run_for(span);
                vec![self.lamp_summary(&format!("OK waited {span}"))]
            }
            Ok(Command::Status) => self.status_lines(),
            Ok(Command::History(count)) => {
                self.history_lines(count.map_or(DEFAULT_HISTORY_COUNT, usize::from))
            }
            Ok(Command::Help(topic)) => help_lines(topic),
            Err(err) => vec![format!("ERR syntax {err}")],
        };

        let mut notifications = self.telemetry.drain();
        if !notifications.is_empty() {
            notifications.append(&mut lines);
            lines = notifications;
        }

        self.record_output(&lines)?;
        Ok(lines)
    }

    fn set_button(&mut self, level: LineLevel) {
        self.button = level;
        self.poll_once();
    }

    fn run_for(&mut self, span: Milliseconds) {
        let mut remaining = span;
        while remaining != Milliseconds::ZERO {
            let step = if remaining.as_u32() < self.poll_period.as_u32() {
                remaining
            } else {
                self.poll_period
            };
            self.now = self.now.wrapping_add(step);
            remaining = remaining.saturating_sub(step);
            self.poll_once();
        }
    }

    fn poll_once(&mut self) {
        self.controller
            .poll(self.button, self.now, &mut self.telemetry);
    }

    fn lamp_summary(&self, head: &str) -> String {
        format!("{head} t={} {}", self.now, self.outputs())
    }

    fn status_lines(&self) -> Vec<String> {
        let snapshot = StatusSnapshot::capture(&self.controller, self.now);
        let outputs = self.outputs();
        let pins = ALL_SIGNALS
            .iter()
            .map(|line| {
                let level = line.polarity.level_for(outputs.get(line.id));
                format!(
                    "{}({}/{})={}",
                    line.name,
                    line.mcu_pin,
                    line.relay_channel,
                    if level.is_high() { "high" } else { "low" }
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        let button = self.controller.debouncer().last_level();
        let timing = self.controller.modes().timing();
        vec![
            snapshot.to_string(),
            format!(
                "pins: {pins} {}({})={}",
                BUTTON_LINE.name,
                BUTTON_LINE.mcu_pin,
                if button.is_high() { "high" } else { "low" }
            ),
            format!(
                "timing: debounce={} blink={} red={} green={}",
                timing.debounce, timing.blink_interval, timing.red_hold, timing.green_blink
            ),
            format!("lamp writes: {}", self.controller.driver().writes()),
        ]
    }

    fn history_lines(&self, count: usize) -> Vec<String> {
        let log = &self.telemetry.log;
        if log.is_empty() || count == 0 {
            return vec!["history empty".to_string()];
        }

        let skip = log.len().saturating_sub(count);
        let mut lines = vec![format!(
            "history ({} of {} recorded)",
            log.len() - skip,
            log.total_recorded()
        )];
        lines.extend(log.oldest_first().skip(skip).map(|record| format!("  {record}")));
        lines
    }

    fn record_output(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            self.transcript
                .append_line(self.now, TranscriptRole::Emulator, line)?;
        }
        Ok(())
    }
}

fn help_lines(topic: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    match topic {
        Some(target) => {
            if let Some((_, detail)) = HELP_TOPICS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(target))
            {
                lines.push((*detail).to_string());
            } else {
                lines.push(format!("No help available for `{target}`."));
                lines.push(format!("Available topics: {}", help_topic_list()));
            }
        }
        None => {
            lines.push("Available commands:".to_string());
            for (_, detail) in HELP_TOPICS {
                lines.push(format!("  {detail}"));
            }
            lines.push("Type `help <topic>` for a specific command.".to_string());
        }
    }
    lines
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

struct TranscriptLogger {
    writer: BufWriter<fs::File>,
}

impl TranscriptLogger {
    fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header()?;
        Ok(logger)
    }

    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "# Traffic light emulator transcript")?;
        writeln!(
            self.writer,
            "# Timestamps are simulated milliseconds since power-up"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        now: Milliseconds,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>8} ms] {} {}",
            now.as_u32(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_core::controller::{AutoPhase, Mode};
    use signal_core::telemetry::TELEMETRY_RING_CAPACITY;

    fn session(name: &str) -> (Session, PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "signal-emulator-{name}-{}.log",
            std::process::id()
        ));
        let config = SessionConfig {
            transcript_path: path.clone(),
            ..SessionConfig::default()
        };
        (Session::new(&config).expect("session"), path)
    }

    #[test]
    fn startup_banner_is_reported_once() {
        let (mut session, path) = session("banner");
        let banner = session.take_notifications().expect("banner");
        assert_eq!(banner.len(), 1);
        assert!(banner[0].contains("traffic light controller"));
        assert!(session.take_notifications().expect("drained").is_empty());
        assert_eq!(session.outputs(), OutputSignals::OFF);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn taps_walk_through_the_modes() {
        let (mut session, path) = session("walk");
        session.take_notifications().expect("banner");

        let lines = session.handle_command("tap").expect("tap");
        assert!(lines[0].contains(Mode::Red.label()), "{lines:?}");
        assert_eq!(session.outputs(), OutputSignals::RED);

        session.handle_command("tap 60ms").expect("tap");
        assert_eq!(session.outputs(), OutputSignals::GREEN);

        session.handle_command("TAP").expect("tap");
        assert_eq!(session.controller.modes().mode(), Mode::Auto);
        assert_eq!(session.outputs(), OutputSignals::RED);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn short_tap_is_debounced_away() {
        let (mut session, path) = session("bounce");
        session.handle_command("tap 30ms").expect("tap");
        assert_eq!(session.controller.modes().mode(), Mode::Off);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn press_without_release_advances_once() {
        let (mut session, path) = session("hold");
        session.handle_command("press").expect("press");
        session.handle_command("wait 2s").expect("wait");
        assert_eq!(session.controller.modes().mode(), Mode::Red);
        assert!(session.controller.debouncer().is_pressed());

        session.handle_command("release").expect("release");
        assert!(!session.controller.debouncer().is_pressed());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn wait_reports_auto_phase_changes() {
        let (mut session, path) = session("auto");
        for _ in 0..3 {
            session.handle_command("tap").expect("tap");
        }

        let lines = session.handle_command("wait 3s").expect("wait");
        assert!(
            lines
                .iter()
                .any(|line| line.contains(AutoPhase::GreenBlink.label())),
            "{lines:?}"
        );
        assert_eq!(session.outputs(), OutputSignals::GREEN);

        let lines = session.handle_command("wait 1s").expect("wait");
        assert!(lines.iter().any(|line| line.contains("green blink off")));
        assert_eq!(session.outputs(), OutputSignals::OFF);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn coarse_poll_period_still_lands_on_the_requested_time() {
        let path = std::env::temp_dir().join(format!(
            "signal-emulator-coarse-{}.log",
            std::process::id()
        ));
        let config = SessionConfig {
            poll_period: Milliseconds::new(7),
            transcript_path: path.clone(),
            ..SessionConfig::default()
        };
        let mut session = Session::new(&config).expect("session");
        session.handle_command("wait 100").expect("wait");
        assert_eq!(session.now, Milliseconds::new(100));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn zero_poll_period_is_rejected() {
        let config = SessionConfig {
            poll_period: Milliseconds::ZERO,
            ..SessionConfig::default()
        };
        assert!(Session::new(&config).is_err());
    }

    #[test]
    fn status_and_history_describe_the_controller() {
        let (mut session, path) = session("status");
        session.handle_command("tap").expect("tap");

        let status = session.handle_command("status").expect("status");
        assert!(status[0].contains("mode=red"), "{status:?}");
        assert!(status[1].contains("RED(PA6/K1)=low"), "{status:?}");
        assert!(status[1].contains("GREEN(PA7/K2)=high"), "{status:?}");
        assert!(status[1].contains("MODE(PB2)=high"), "{status:?}");
        assert_eq!(
            status[2],
            "timing: debounce=50ms blink=1000ms red=3000ms green=6000ms"
        );

        session.handle_command("press").expect("press");
        let held = session.handle_command("status").expect("status");
        assert!(held[1].contains("MODE(PB2)=low"), "{held:?}");
        session.handle_command("release").expect("release");

        let history = session.handle_command("history 1").expect("history");
        assert_eq!(history.len(), 2);
        assert!(history[1].contains(Mode::Red.label()));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_commands_report_errors() {
        let (mut session, path) = session("errors");
        session.take_notifications().expect("banner");
        let lines = session.handle_command("wait forever").expect("wait");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ERR syntax"));

        let help = session.handle_command("help bogus").expect("help");
        assert!(help[0].contains("bogus"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn long_wait_reports_only_the_newest_notifications() {
        let (mut session, path) = session("long-wait");
        for _ in 0..3 {
            session.handle_command("tap").expect("tap");
        }

        let lines = session.handle_command("wait 600s").expect("wait");
        assert_eq!(lines.len(), TELEMETRY_RING_CAPACITY + 2, "{lines:?}");
        assert!(lines[0].ends_with("earlier notifications omitted"), "{lines:?}");
        assert!(lines[lines.len() - 1].starts_with("OK waited 600000ms"));

        let lines = session.handle_command("status").expect("status");
        assert!(lines[0].contains("mode=auto"), "{lines:?}");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn transcript_records_both_directions() {
        let (mut session, path) = session("transcript");
        session.take_notifications().expect("banner");
        session.handle_command("tap").expect("tap");
        drop(session);

        let contents = fs::read_to_string(&path).expect("transcript");
        assert!(contents.starts_with("# Traffic light emulator transcript"));
        assert!(contents.contains("HOST> tap"));
        assert!(contents.contains("EMU < OK tap hold=100ms"));
        let _ = fs::remove_file(path);
    }
}
