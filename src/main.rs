//! Firmware driving a BCM4330 Bluetooth radio from an STM32L031.
//!
//! # Overview
//!
//! The radio starts powered down and blocked. A push button toggles the
//! block request; each request is served through the rfkill driver, which
//! runs the power sequence and reports a status code.
//!
//! # Clocks
//!
//! The LSE crystal runs the RTC and is also routed out on MCO as the
//! radio's 32 kHz sleep clock while it is powered.
//!
//! # Spawned Tasks
//!
//! - **rfkill_task**: Serves block/unblock requests and tracks switch state
//! - **button_task**: Debounces the button and posts toggle requests

#![no_std]
#![no_main]

mod hardware;

use bcm4330_rfkill::{
    Bcm4330Rfkill, BoardConfig, NoRetention, Registry, RfkillOps, SwitchRegistry, status_code,
};
use embassy_executor::Spawner;
use embassy_stm32::{
    Config,
    gpio::Input,
    rcc::{LsConfig, LseConfig, mux::ClockMux},
    time::Hertz,
};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::{Delay, Timer};
use {defmt_rtt as _, panic_probe as _};

use hardware::{BOARD_RESOURCES, Board, Peripherals};

/// Button sampling period in milliseconds.
const BUTTON_POLL_MS: u64 = 20;

type Rfkill = Bcm4330Rfkill<CriticalSectionRawMutex, Board, Delay, NoRetention, SwitchRegistry<1>>;

/// Block requests from the button to the rfkill task (true = block).
static BLOCK_REQUEST: Signal<CriticalSectionRawMutex, bool> = Signal::new();

/// Creates the clock configuration: MSI system clock, LSE for RTC and MCO.
fn create_clock_config() -> embassy_stm32::rcc::Config {
    embassy_stm32::rcc::Config {
        #[cfg(feature = "debug-mode")]
        msi: Some(embassy_stm32::rcc::MSIRange::RANGE2M),
        #[cfg(not(feature = "debug-mode"))]
        msi: Some(embassy_stm32::rcc::MSIRange::RANGE66K),
        hsi: false,
        hse: None,
        pll: None,
        sys: embassy_stm32::rcc::Sysclk::MSI,
        ahb_pre: embassy_stm32::rcc::AHBPrescaler::DIV1,
        apb1_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        apb2_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        ls: LsConfig {
            rtc: embassy_stm32::rcc::RtcClockSource::LSE,
            lsi: false,
            lse: Some(LseConfig {
                frequency: Hertz::hz(32768),
                mode: embassy_stm32::rcc::LseMode::Oscillator(embassy_stm32::rcc::LseDrive::Low),
            }),
        },
        voltage_scale: embassy_stm32::rcc::VoltageScale::RANGE1,
        mux: ClockMux::default(),
    }
}

/// Serves block requests for the radio.
///
/// The switch state in the registry follows each request once the driver
/// reports success.
#[embassy_executor::task]
async fn rfkill_task(rfkill: Rfkill, mut registry: SwitchRegistry<1>) {
    loop {
        let blocked = BLOCK_REQUEST.wait().await;
        let status = status_code(&rfkill.set_block(blocked).await);
        if status == 0 {
            registry.set_states(rfkill.registration(), blocked, blocked);
            defmt::info!("bcm4330 {}", if blocked { "blocked" } else { "unblocked" });
        } else {
            defmt::error!("set_block({}) failed: {}", blocked, status);
        }
    }
}

/// Toggles the block request on every press of the button.
#[embassy_executor::task]
async fn button_task(button: Input<'static>) {
    let mut blocked = true;
    let mut was_pressed = false;
    loop {
        Timer::after_millis(BUTTON_POLL_MS).await;
        let pressed = button.is_low();
        if pressed && !was_pressed {
            blocked = !blocked;
            BLOCK_REQUEST.signal(blocked);
        }
        was_pressed = pressed;
    }
}

/// Main entry point.
///
/// # Initialization Sequence
///
/// 1. Configure clocks (MSI system clock, LSE for RTC and MCO)
/// 2. Initialize STM32 peripherals and park the radio lines low
/// 3. Attach the rfkill driver (radio registered blocked)
/// 4. Spawn the rfkill and button tasks
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut config = Config::default();
    config.rcc = create_clock_config();

    let p = embassy_stm32::init(config);

    #[cfg(feature = "debug-mode")]
    defmt::info!("bcm4330 rfkill firmware starting...");

    let Peripherals { mut board, button } = Peripherals::new(p);
    let mut registry = SwitchRegistry::new();

    let rfkill = match Rfkill::attach(
        &BoardConfig::new(&BOARD_RESOURCES),
        &mut board,
        &mut registry,
        Delay,
        None,
    ) {
        Ok(rfkill) => rfkill,
        Err(e) => {
            defmt::error!("bcm4330 attach failed: {}", e);
            return;
        }
    };

    #[cfg(feature = "debug-mode")]
    defmt::info!("Spawning rfkill and button tasks...");

    spawner.spawn(rfkill_task(rfkill, registry)).unwrap();
    spawner.spawn(button_task(button)).unwrap();
}
