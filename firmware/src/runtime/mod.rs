use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use signal_core::signals::{BUTTON_LINE, SignalId, signal_by_id};

use crate::lamps::{self, RelayBank};

mod control_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

fn initial_level(line: SignalId) -> Level {
    if lamps::off_level(line).is_high() {
        Level::High
    } else {
        Level::Low
    }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals { PA6, PA7, PB2, .. } = hal::init(config);

    let red = signal_by_id(SignalId::Red);
    let green = signal_by_id(SignalId::Green);
    defmt::info!(
        "pins: {}={}/{} {}={}/{} {}={}",
        red.name,
        red.mcu_pin,
        red.relay_channel,
        green.name,
        green.mcu_pin,
        green.relay_channel,
        BUTTON_LINE.name,
        BUTTON_LINE.mcu_pin
    );

    let lamps = RelayBank::new(
        Output::new(PA6, initial_level(SignalId::Red), Speed::Low),
        Output::new(PA7, initial_level(SignalId::Green), Speed::Low),
    );
    let button = Input::new(PB2, Pull::Up);

    spawner
        .spawn(control_task::run(button, lamps))
        .expect("failed to spawn control task");

    core::future::pending::<()>().await;
}
