//! Board wiring of the BCM4330 carrier on the STM32L031 host.
//!
//! # Pin Assignments
//!
//! ## Radio Control
//! - **PB1** (line 17): BT_RST_N - Active-low reset of the Bluetooth core
//! - **PB7** (line 23): BT_REG_ON - Active-low shutdown of the BT regulator
//! - **PA8**: MCO - 32.768 kHz LSE routed out as the radio's sleep clock
//!
//! ## User Input
//! - **PA0**: BT_BTN_N - Active-low push button toggling the radio
//!
//! ## Low Power & RTC
//! - **PC14**: OSC32_IN - 32.768 kHz crystal input
//! - **PC15**: OSC32_OUT - 32.768 kHz crystal output
//!
//! Line numbers follow `port * 16 + pin`, so PB1 is 17 and PB7 is 23.

use bcm4330_rfkill::driver::{NRESET_GPIO, NSHUTDOWN_GPIO};
use bcm4330_rfkill::{LineId, Platform, ReferenceClock, Resource};
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::pac;
use embassy_stm32::pac::rcc::vals::{Mcopre, Mcosel};

/// GPIO line of BT_RST_N (PB1).
pub const NRESET_LINE: u32 = 17;
/// GPIO line of BT_REG_ON (PB7).
pub const NSHUTDOWN_LINE: u32 = 23;

/// MCO pin index on GPIOA.
const MCO_PIN: usize = 8;

/// Resource table handed to the driver at attach.
pub static BOARD_RESOURCES: [Resource; 2] = [
    Resource {
        name: NRESET_GPIO,
        line: NRESET_LINE,
    },
    Resource {
        name: NSHUTDOWN_GPIO,
        line: NSHUTDOWN_LINE,
    },
];

/// LSE routed to the MCO pin.
///
/// The LSE itself keeps running for the RTC; gating only switches the MCO
/// mux so the radio stops seeing edges.
pub struct LseMco(());

impl ReferenceClock for LseMco {
    fn enable(&mut self) {
        pac::RCC.cfgr().modify(|w| {
            w.set_mcopre(Mcopre::DIV1);
            w.set_mcosel(Mcosel::LSE);
        });
    }

    fn disable(&mut self) {
        pac::RCC.cfgr().modify(|w| w.set_mcosel(Mcosel::DISABLE));
    }
}

/// Radio resources of the board that have not been handed out yet.
pub struct Board {
    nreset: Option<Output<'static>>,
    nshutdown: Option<Output<'static>>,
    mco: Option<LseMco>,
}

impl Platform for Board {
    type Pin = Output<'static>;
    type Clock = LseMco;

    fn clock_get(&mut self, name: &str) -> Option<LseMco> {
        if name != bcm4330_rfkill::driver::CLOCK_32K {
            return None;
        }
        self.mco.take()
    }

    fn clock_put(&mut self, clock: LseMco) {
        self.mco = Some(clock);
    }

    fn gpio_request(&mut self, line: LineId, label: &'static str) -> Option<Output<'static>> {
        let pin = match line.number() {
            NRESET_LINE => self.nreset.take(),
            NSHUTDOWN_LINE => self.nshutdown.take(),
            _ => None,
        };
        if pin.is_some() {
            defmt::debug!("gpio {} requested as {}", line.number(), label);
        }
        pin
    }

    fn gpio_free(&mut self, line: LineId, pin: Output<'static>) {
        match line.number() {
            NRESET_LINE => self.nreset = Some(pin),
            NSHUTDOWN_LINE => self.nshutdown = Some(pin),
            _ => {}
        }
    }
}

/// Top-level peripheral container.
pub struct Peripherals {
    /// Radio control resources
    pub board: Board,
    /// Radio toggle button (PA0, active-low)
    pub button: Input<'static>,
}

impl Peripherals {
    /// Initializes all peripherals from the STM32 peripheral singleton.
    ///
    /// # Initial GPIO States
    ///
    /// - PB1 (BT_RST_N): Low (core held in reset)
    /// - PB7 (BT_REG_ON): Low (regulator off)
    /// - PA8 (MCO): Alternate function 0, mux disabled
    /// - PA0 (BT_BTN_N): Input with pull-up
    ///
    /// # Arguments
    ///
    /// * `p` - STM32 peripheral singleton from embassy_stm32::init()
    pub fn new(p: embassy_stm32::Peripherals) -> Self {
        setup_mco();

        Self {
            board: Board {
                nreset: Some(Output::new(p.PB1, Level::Low, Speed::Low)),
                nshutdown: Some(Output::new(p.PB7, Level::Low, Speed::Low)),
                mco: Some(LseMco(())),
            },
            button: Input::new(p.PA0, Pull::Up),
        }
    }
}

/// Puts PA8 on AF0 (MCO) with the MCO mux disabled.
///
/// The PAC is used directly since the pin is only ever driven by the RCC.
fn setup_mco() {
    pac::RCC.cfgr().modify(|w| w.set_mcosel(Mcosel::DISABLE));

    let gpioa = pac::GPIOA;
    gpioa
        .afr(MCO_PIN / 8)
        .modify(|w| w.set_afr(MCO_PIN % 8, 0));
    gpioa
        .moder()
        .modify(|w| w.set_moder(MCO_PIN, pac::gpio::vals::Moder::ALTERNATE));
}
