use embassy_futures::yield_now;
use embassy_stm32::gpio::{Input, Output};
use signal_core::controller::Controller;
use signal_core::signals::LineLevel;
use signal_core::timing::TimingConfig;

use crate::clock;
use crate::lamps::RelayBank;
use crate::telemetry::DefmtTelemetry;

/// Samples the button and rewrites the relays as fast as the executor allows.
#[embassy_executor::task]
pub async fn run(button: Input<'static>, lamps: RelayBank<Output<'static>>) -> ! {
    let mut telemetry = DefmtTelemetry::new();
    let mut controller = Controller::new(lamps, TimingConfig::STANDARD);
    controller.start(clock::now(), &mut telemetry);

    loop {
        let level = LineLevel::from_high(button.is_high());
        controller.poll(level, clock::now(), &mut telemetry);
        yield_now().await;
    }
}
