//! Telemetry event catalog and history buffer shared by firmware and host targets.
//!
//! The controller never prints. Every notification point (startup banner,
//! mode change, automatic phase change, blink toggle) is reported exactly once
//! as a [`TelemetryEventKind`] through a [`TelemetrySink`]. Firmware forwards
//! the events to defmt, the emulator prints them to the console, and tests
//! inspect them through [`TelemetryLog`].

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::controller::{AutoPhase, Mode};
use crate::timing::Milliseconds;

/// Identifier used when tracking emitted telemetry events.
pub type EventId = u32;

/// Discriminated notifications emitted by the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEventKind {
    /// Controller came out of reset with both lamps released.
    Startup,
    /// A debounced press advanced the operating mode.
    ModeChanged(Mode),
    /// The automatic cycle moved to another phase.
    PhaseChanged(AutoPhase),
    /// The blinking green lamp flipped; `true` means lit.
    BlinkToggled(bool),
}

impl TelemetryEventKind {
    /// Fixed human-readable text for the event, suitable for defmt.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            TelemetryEventKind::Startup => "=== traffic light controller ===",
            TelemetryEventKind::ModeChanged(mode) => mode.label(),
            TelemetryEventKind::PhaseChanged(phase) => phase.label(),
            TelemetryEventKind::BlinkToggled(true) => "green blink on",
            TelemetryEventKind::BlinkToggled(false) => "green blink off",
        }
    }
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEventKind::Startup => f.write_str(self.label()),
            TelemetryEventKind::ModeChanged(mode) => write!(f, ">> mode: {}", mode.label()),
            TelemetryEventKind::PhaseChanged(phase) => {
                write!(f, "   >> auto phase: {}", phase.label())
            }
            TelemetryEventKind::BlinkToggled(_) => write!(f, "   [auto] {}", self.label()),
        }
    }
}

/// Receiver for controller notifications.
pub trait TelemetrySink {
    /// Records one notification stamped with the poll time that produced it.
    fn record(&mut self, event: TelemetryEventKind, timestamp: Milliseconds);
}

/// Sink that discards every notification.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record(&mut self, _: TelemetryEventKind, _: Milliseconds) {}
}

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TelemetryRecord {
    pub id: EventId,
    pub timestamp: Milliseconds,
    pub event: TelemetryEventKind,
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:<4} t={:>8}ms {}",
            self.id,
            self.timestamp.as_u32(),
            self.event
        )
    }
}

/// Telemetry ring buffer type alias.
pub type TelemetryRing<const CAPACITY: usize = TELEMETRY_RING_CAPACITY> =
    HistoryBuf<TelemetryRecord, CAPACITY>;

/// Records telemetry events into a fixed-size ring buffer.
pub struct TelemetryLog<const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: TelemetryRing<CAPACITY>,
    next_event_id: EventId,
}

impl<const CAPACITY: usize> TelemetryLog<CAPACITY> {
    /// Creates a new telemetry log with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Returns an iterator over the recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent telemetry record, if available.
    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no telemetry records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Total number of events recorded, including ones evicted from the ring.
    #[must_use]
    pub const fn total_recorded(&self) -> EventId {
        self.next_event_id
    }

    /// Counts stored records matching `predicate`.
    pub fn count_matching<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&TelemetryEventKind) -> bool,
    {
        self.oldest_first()
            .filter(|record| predicate(&record.event))
            .count()
    }
}

impl<const CAPACITY: usize> Default for TelemetryLog<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAPACITY: usize> TelemetrySink for TelemetryLog<CAPACITY> {
    fn record(&mut self, event: TelemetryEventKind, timestamp: Milliseconds) {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
        });
    }
}
