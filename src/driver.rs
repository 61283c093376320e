//! Attach/detach of the BCM4330 rfkill device.
//!
//! Attach acquires the clock and control lines named by the board, parks the
//! radio powered down and registers it as a Bluetooth switch. Detach hands
//! every resource back. A failed attach leaves nothing acquired.

use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal::digital::StatefulOutputPin;
use embedded_hal_async::delay::DelayNs;

use crate::clock::ReferenceClock;
use crate::error::Error;
use crate::line::{Line, LineId};
use crate::retention::Retention;
use crate::rfkill::{RadioType, Registry, RfkillDesc, RfkillOps};
use crate::sequencer::{ControlLines, PowerSequencer, PowerState, Resources};

/// Clock name of the 32 kHz reference clock.
pub const CLOCK_32K: &str = "bcm4330_32k_clk";
/// Resource name of the active-low reset line.
pub const NRESET_GPIO: &str = "bcm4330_nreset_gpio";
/// Resource name of the active-low shutdown line.
pub const NSHUTDOWN_GPIO: &str = "bcm4330_nshutdown_gpio";
/// Name the switch is registered under.
pub const RADIO_NAME: &str = "bcm4330 Bluetooth";

/// A named board resource resolved to a GPIO number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub name: &'static str,
    /// GPIO number, 0 if the line is not wired.
    pub line: u32,
}

/// Board description consumed by [`Bcm4330Rfkill::attach`].
#[derive(Debug, Clone, Copy)]
pub struct BoardConfig<'a> {
    pub clock_name: &'a str,
    pub resources: &'a [Resource],
    /// Start with the clock running and the switch unblocked.
    pub start_enabled: bool,
}

impl<'a> BoardConfig<'a> {
    pub const fn new(resources: &'a [Resource]) -> Self {
        Self {
            clock_name: CLOCK_32K,
            resources,
            start_enabled: false,
        }
    }

    /// Line wired for `name`, if any.
    pub fn line(&self, name: &str) -> Option<LineId> {
        self.resources
            .iter()
            .find(|r| r.name == name)
            .and_then(|r| LineId::new(r.line))
    }
}

/// Resource provider of the platform the radio sits on.
pub trait Platform {
    type Pin: StatefulOutputPin<Error = Infallible>;
    type Clock: ReferenceClock;

    fn clock_get(&mut self, name: &str) -> Option<Self::Clock>;
    fn clock_put(&mut self, clock: Self::Clock);

    /// Take ownership of `line` as an output.
    fn gpio_request(&mut self, line: LineId, label: &'static str) -> Option<Self::Pin>;
    fn gpio_free(&mut self, line: LineId, pin: Self::Pin);
}

type Sequencer<B, D, R> = PowerSequencer<<B as Platform>::Pin, <B as Platform>::Clock, D, R>;

/// An attached BCM4330 radio.
pub struct Bcm4330Rfkill<M, B, D, R, G>
where
    M: RawMutex,
    B: Platform,
    G: Registry,
{
    sequencer: Mutex<M, Sequencer<B, D, R>>,
    registration: G::Registration,
}

impl<M, B, D, R, G> Bcm4330Rfkill<M, B, D, R, G>
where
    M: RawMutex,
    B: Platform,
    D: DelayNs,
    R: Retention,
    G: Registry,
{
    /// Acquires the radio's resources and registers it.
    ///
    /// # Arguments
    ///
    /// * `config` - Board resource names and defaults
    /// * `platform` - Provider of the clock and GPIO lines
    /// * `registry` - Radio-block framework to register into
    /// * `delay` - Wall-clock delay for the power-up settle waits
    /// * `retention` - Retention gate shared with the radio's pads, if the
    ///   board has one
    pub fn attach(
        config: &BoardConfig<'_>,
        platform: &mut B,
        registry: &mut G,
        delay: D,
        retention: Option<R>,
    ) -> Result<Self, Error> {
        let reset_id = config.line(NRESET_GPIO);
        let shutdown_id = config.line(NSHUTDOWN_GPIO);
        if reset_id.is_none() && shutdown_id.is_none() {
            warn!("no reset or shutdown gpio defined for this platform");
            return Err(Error::NoDevice);
        }

        let clock = platform.clock_get(config.clock_name);
        if clock.is_none() {
            warn!("can't find {}, assuming 32k clock to chip", config.clock_name);
        }

        let reset = request_line(platform, reset_id, NRESET_GPIO);
        let shutdown = request_line(platform, shutdown_id, NSHUTDOWN_GPIO);
        if reset.is_none() && shutdown.is_none() {
            if let Some(clock) = clock {
                platform.clock_put(clock);
            }
            return Err(Error::NoDevice);
        }

        let mut sequencer = PowerSequencer::new(ControlLines { reset, shutdown }, clock, delay, retention);

        if config.start_enabled {
            sequencer.enable_clock();
        }
        sequencer.quiesce();

        let desc = RfkillDesc {
            name: RADIO_NAME,
            kind: RadioType::Bluetooth,
            default_blocked: !config.start_enabled,
        };
        let registration = match registry.register(&desc) {
            Ok(registration) => registration,
            Err(e) => {
                error!("failed to register {}: {}", RADIO_NAME, e);
                release(platform, sequencer.into_resources());
                return Err(e.into());
            }
        };
        registry.set_states(&registration, desc.default_blocked, false);

        Ok(Self {
            sequencer: Mutex::new(sequencer),
            registration,
        })
    }

    /// Unregisters the radio and returns every resource to the platform.
    pub fn detach(self, platform: &mut B, registry: &mut G) {
        let Resources {
            lines,
            clock,
            clock_enabled,
        } = self.sequencer.into_inner().into_resources();

        if let Some(mut clock) = clock {
            if clock_enabled {
                clock.disable();
            }
            platform.clock_put(clock);
        }
        registry.unregister(&self.registration);
        registry.destroy(self.registration);
        free_lines(platform, lines);
    }

    pub fn registration(&self) -> &G::Registration {
        &self.registration
    }

    /// Power state as read back from the shutdown line.
    pub async fn power_state(&self) -> PowerState {
        self.sequencer.lock().await.state()
    }
}

impl<M, B, D, R, G> RfkillOps for Bcm4330Rfkill<M, B, D, R, G>
where
    M: RawMutex,
    B: Platform,
    D: DelayNs,
    R: Retention,
    G: Registry,
{
    /// Serializes callers for the whole transition.
    async fn set_block(&self, blocked: bool) -> Result<(), Error> {
        self.sequencer.lock().await.set_power(blocked).await;
        Ok(())
    }
}

fn request_line<B: Platform>(
    platform: &mut B,
    id: Option<LineId>,
    label: &'static str,
) -> Option<Line<B::Pin>> {
    let Some(id) = id else {
        warn!("can't find {}, it may not be defined for this platform", label);
        return None;
    };
    match platform.gpio_request(id, label) {
        Some(pin) => Some(Line::new(id, pin)),
        None => {
            warn!("can't request {} (gpio {})", label, id.number());
            None
        }
    }
}

/// Rollback in reverse acquisition order.
fn release<B: Platform>(platform: &mut B, resources: Resources<B::Pin, B::Clock>) {
    let Resources {
        lines,
        clock,
        clock_enabled,
    } = resources;

    free_lines(platform, lines);
    if let Some(mut clock) = clock {
        if clock_enabled {
            clock.disable();
        }
        platform.clock_put(clock);
    }
}

fn free_lines<B: Platform>(platform: &mut B, lines: ControlLines<B::Pin>) {
    if let Some(shutdown) = lines.shutdown {
        let (id, pin) = shutdown.into_parts();
        platform.gpio_free(id, pin);
    }
    if let Some(reset) = lines.reset {
        let (id, pin) = reset.into_parts();
        platform.gpio_free(id, pin);
    }
}
