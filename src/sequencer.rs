//! Power sequencing for the BCM4330.
//!
//! # Hardware Design
//!
//! The radio has two active-low control inputs and a sleep clock input:
//! - NSHUTDOWN (BT_REG_ON): gates the Bluetooth regulator
//! - NRESET: holds the Bluetooth core in reset
//! - 32K: 32.768 kHz reference clock, optional when the board feeds it
//!   from a free-running oscillator
//!
//! Either control line may be missing on a given board. The chip latches an
//! edge only after the line has been held for [`SETTLE_MS`], so power-up
//! pulses each line low then high with a settle wait after every edge.
//!
//! # State of record
//!
//! There is no stored power flag. The output level of NSHUTDOWN *is* the
//! power state: high means the radio is powered (unblocked).

use core::convert::Infallible;

use embedded_hal::digital::{PinState, StatefulOutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::clock::ReferenceClock;
use crate::line::Line;
use crate::retention::Retention;

/// Minimum hold time of each reset/shutdown edge, in milliseconds.
pub const SETTLE_MS: u32 = 100;

/// Observable power state of the radio.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Control lines deasserted, clock gated (initial state)
    #[default]
    PoweredDown,
    /// Both present lines released after a full pulse sequence
    Powered,
}

/// Control lines of one chip. At least one is present.
pub struct ControlLines<P> {
    pub reset: Option<Line<P>>,
    pub shutdown: Option<Line<P>>,
}

/// Resources handed back by [`PowerSequencer::into_resources`].
pub struct Resources<P, C> {
    pub lines: ControlLines<P>,
    pub clock: Option<C>,
    /// The clock was left enabled by the last transition.
    pub clock_enabled: bool,
}

/// Drives the control lines and reference clock of one radio.
pub struct PowerSequencer<P, C, D, R> {
    lines: ControlLines<P>,
    clock: Option<C>,
    clock_enabled: bool,
    delay: D,
    retention: Option<R>,
}

impl<P, C, D, R> PowerSequencer<P, C, D, R>
where
    P: StatefulOutputPin<Error = Infallible>,
    C: ReferenceClock,
    D: DelayNs,
    R: Retention,
{
    /// Creates a sequencer over already-acquired resources.
    ///
    /// # Arguments
    ///
    /// * `lines` - Reset and shutdown outputs
    /// * `clock` - 32 kHz reference clock, `None` if supplied externally
    /// * `delay` - Wall-clock delay used for the settle waits
    /// * `retention` - Retention gate of the pad group shared with the radio
    pub fn new(lines: ControlLines<P>, clock: Option<C>, delay: D, retention: Option<R>) -> Self {
        Self {
            lines,
            clock,
            clock_enabled: false,
            delay,
            retention,
        }
    }

    /// Drives every present line low without pulsing.
    ///
    /// This is the quiescent baseline established at attach, not a power
    /// transition: the retention gate is not touched.
    pub fn quiesce(&mut self) {
        if let Some(shutdown) = self.lines.shutdown.as_mut() {
            shutdown.drive(PinState::Low);
        }
        if let Some(reset) = self.lines.reset.as_mut() {
            reset.drive(PinState::Low);
        }
    }

    /// True when NSHUTDOWN is driven high, i.e. the radio is unblocked.
    ///
    /// A board without a shutdown line never reports unblocked.
    pub fn is_unblocked(&mut self) -> bool {
        self.lines
            .shutdown
            .as_mut()
            .is_some_and(|shutdown| shutdown.is_high())
    }

    /// True when a request would not change anything.
    ///
    /// Only "unblock while already unblocked" is redundant. A block request
    /// always re-runs the deassert path.
    pub fn is_redundant(&mut self, blocked: bool) -> bool {
        !blocked && self.is_unblocked()
    }

    pub fn state(&mut self) -> PowerState {
        if self.is_unblocked() {
            PowerState::Powered
        } else {
            PowerState::PoweredDown
        }
    }

    /// Moves the radio to the requested state.
    ///
    /// # Arguments
    ///
    /// * `blocked` - True to power down, false to power up
    pub async fn set_power(&mut self, blocked: bool) {
        if self.is_redundant(blocked) {
            return;
        }

        if let Some(gate) = self.retention.as_ref() {
            gate.disable();
        }

        if blocked {
            self.power_down();
        } else {
            self.power_up().await;
        }

        if let Some(gate) = self.retention.as_ref() {
            gate.enable();
        }
    }

    /// Immediate deassertion: shutdown, then reset, then clock.
    fn power_down(&mut self) {
        info!("bcm4330 power off");
        self.quiesce();
        self.disable_clock();
    }

    /// Clock first so it is stable before the chip samples it, then the
    /// shutdown pulse, then the reset pulse.
    async fn power_up(&mut self) {
        info!("bcm4330 power on");
        self.enable_clock();
        if let Some(shutdown) = self.lines.shutdown.as_mut() {
            pulse(shutdown, &mut self.delay).await;
        }
        if let Some(reset) = self.lines.reset.as_mut() {
            pulse(reset, &mut self.delay).await;
        }
    }

    pub fn enable_clock(&mut self) {
        if let Some(clock) = self.clock.as_mut() {
            clock.enable();
            self.clock_enabled = true;
        }
    }

    pub fn disable_clock(&mut self) {
        if let Some(clock) = self.clock.as_mut() {
            clock.disable();
            self.clock_enabled = false;
        }
    }

    /// Tears the sequencer apart, leaving lines and clock as they are.
    pub fn into_resources(self) -> Resources<P, C> {
        Resources {
            lines: self.lines,
            clock: self.clock,
            clock_enabled: self.clock_enabled,
        }
    }
}

/// Low for one settle interval, then high for another.
async fn pulse<P, D>(line: &mut Line<P>, delay: &mut D)
where
    P: StatefulOutputPin<Error = Infallible>,
    D: DelayNs,
{
    debug!("pulsing gpio {}", line.id().number());
    line.drive(PinState::Low);
    delay.delay_ms(SETTLE_MS).await;
    line.drive(PinState::High);
    delay.delay_ms(SETTLE_MS).await;
}
