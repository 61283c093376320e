//! Error types for attach and block requests.

use core::fmt;

use crate::rfkill::RegistryError;

/// Kernel errno for "no such device".
pub const ENODEV: i32 = 19;

/// Driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Neither the reset nor the shutdown line is available, so there is
    /// nothing to control.
    NoDevice,
    /// The radio-block registry refused the switch.
    Registration(RegistryError),
}

impl Error {
    /// Negative errno reported to the radio-block framework.
    ///
    /// Every attach failure maps to `-ENODEV`.
    pub fn errno(&self) -> i32 {
        match self {
            Self::NoDevice | Self::Registration(_) => -ENODEV,
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registration(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevice => write!(f, "no reset or shutdown gpio defined"),
            Self::Registration(e) => write!(f, "rfkill registration failed: {}", e),
        }
    }
}

/// Status code for a block request: `0` on success, negative errno otherwise.
pub fn status_code(result: &Result<(), Error>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => e.errno(),
    }
}
