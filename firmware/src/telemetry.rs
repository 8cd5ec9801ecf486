//! Controller notifications mirrored to the RTT log.
//!
//! Records are kept in a [`TelemetryLog`] so the most recent history can be
//! inspected from a debugger, and each one is echoed through defmt as it
//! arrives. Host builds print to stdout instead so the unit tests exercise the
//! same path.

use signal_core::telemetry::{TelemetryEventKind, TelemetryLog, TelemetrySink};
use signal_core::timing::Milliseconds;

/// Telemetry sink used by the control task.
pub struct DefmtTelemetry {
    log: TelemetryLog,
}

impl DefmtTelemetry {
    pub const fn new() -> Self {
        Self {
            log: TelemetryLog::new(),
        }
    }

    #[cfg(test)]
    pub fn log(&self) -> &TelemetryLog {
        &self.log
    }
}

impl Default for DefmtTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySink for DefmtTelemetry {
    fn record(&mut self, event: TelemetryEventKind, timestamp: Milliseconds) {
        self.log.record(event, timestamp);
        emit_log(event_tag(event), event.label(), timestamp.as_u32());
    }
}

const fn event_tag(event: TelemetryEventKind) -> &'static str {
    match event {
        TelemetryEventKind::Startup => "startup",
        TelemetryEventKind::ModeChanged(_) => "mode",
        TelemetryEventKind::PhaseChanged(_) => "auto",
        TelemetryEventKind::BlinkToggled(_) => "blink",
    }
}

#[cfg(target_os = "none")]
fn emit_log(tag: &'static str, label: &'static str, timestamp_ms: u32) {
    defmt::info!("telemetry:{} {} t={}ms", tag, label, timestamp_ms);
}

#[cfg(not(target_os = "none"))]
fn emit_log(tag: &'static str, label: &'static str, timestamp_ms: u32) {
    println!("telemetry:{tag} {label} t={timestamp_ms}ms");
}
