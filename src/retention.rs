//! Shared I/O deep-power-down (retention) gate.
//!
//! Some boards isolate a group of I/O pads while in low power states. The
//! SDIO pads the radio shares with the host sit in such a group, so the pads
//! must be released from retention while the control lines are being driven.
//! The gate is board-wide and shared with other peripherals: its lock is only
//! ever taken for the enable/disable register write itself.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

/// The raw deep-power-down control of one pad group.
pub trait DeepPowerDown {
    /// Put the pads back under retention.
    fn enable(&mut self);
    /// Release the pads so they can be driven.
    fn disable(&mut self);
}

/// Capability handed to the sequencer for bracketing a transition.
pub trait Retention {
    fn disable(&self);
    fn enable(&self);
}

impl<T: Retention + ?Sized> Retention for &T {
    fn disable(&self) {
        T::disable(self)
    }

    fn enable(&self) {
        T::enable(self)
    }
}

/// A pad group behind its own exclusive lock.
pub struct RetentionGate<M: RawMutex, D> {
    pads: Mutex<M, RefCell<D>>,
}

impl<M: RawMutex, D: DeepPowerDown> RetentionGate<M, D> {
    pub const fn new(pads: D) -> Self {
        Self {
            pads: Mutex::new(RefCell::new(pads)),
        }
    }

    /// Run `f` on the pads while holding the gate lock.
    pub fn with_pads<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        self.pads.lock(|pads| f(&mut pads.borrow_mut()))
    }
}

impl<M: RawMutex, D: DeepPowerDown> Retention for RetentionGate<M, D> {
    fn disable(&self) {
        self.with_pads(|pads| pads.disable());
    }

    fn enable(&self) {
        self.with_pads(|pads| pads.enable());
    }
}

/// Placeholder for boards without a retention facility.
///
/// Uninhabited: the sequencer holds `Option<NoRetention>`, which is always
/// `None`.
pub enum NoRetention {}

impl Retention for NoRetention {
    fn disable(&self) {
        match *self {}
    }

    fn enable(&self) {
        match *self {}
    }
}
