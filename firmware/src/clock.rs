//! Bridge between the Embassy time driver and the controller's wrapping clock.

use embassy_time::Instant;
use signal_core::timing::Milliseconds;

/// Projects a monotonic instant onto the 32-bit millisecond counter.
pub fn to_controller_clock(instant: Instant) -> Milliseconds {
    Milliseconds::from_u64_wrapping(instant.as_millis())
}

/// Current time on the controller clock.
#[cfg(target_os = "none")]
pub fn now() -> Milliseconds {
    to_controller_clock(Instant::now())
}
