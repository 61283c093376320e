//! Reset and shutdown control lines.

use core::convert::Infallible;

use embedded_hal::digital::{PinState, StatefulOutputPin};

/// Board GPIO number of a control line.
///
/// Line 0 is reserved to mean "not wired on this board".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineId(u32);

impl LineId {
    /// Returns `None` for line 0.
    pub const fn new(number: u32) -> Option<Self> {
        if number == 0 { None } else { Some(Self(number)) }
    }

    pub const fn number(self) -> u32 {
        self.0
    }
}

/// An owned output pin together with the line it was requested as.
pub struct Line<P> {
    id: LineId,
    pin: P,
}

impl<P> Line<P>
where
    P: StatefulOutputPin<Error = Infallible>,
{
    pub fn new(id: LineId, pin: P) -> Self {
        Self { id, pin }
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    /// Drive the line to `state`.
    pub fn drive(&mut self, state: PinState) {
        let Ok(()) = self.pin.set_state(state);
    }

    /// Current output level.
    pub fn is_high(&mut self) -> bool {
        let Ok(high) = self.pin.is_set_high();
        high
    }

    /// Give the pin back, e.g. to return it to the platform.
    pub fn into_parts(self) -> (LineId, P) {
        (self.id, self.pin)
    }
}
