//! Radio-block ("rfkill") registration.
//!
//! The driver binds into a registry of controllable radios. The registry owns
//! the user-visible blocked/soft-blocked state; the driver owns the hardware
//! and answers block requests through [`RfkillOps`].

use core::fmt;

use heapless::{String, Vec};

use crate::error::Error;

/// Longest switch name [`SwitchRegistry`] stores.
pub const MAX_NAME_LEN: usize = 32;

/// Radio categories a switch can register as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioType {
    Wlan,
    Bluetooth,
    Uwb,
    Wimax,
    Wwan,
    Gps,
    Fm,
    Nfc,
}

/// Registry failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// No free slot left.
    Full,
    /// The switch name does not fit the registry's storage.
    NameTooLong,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "registry full"),
            Self::NameTooLong => write!(f, "switch name too long"),
        }
    }
}

/// Description of a switch being registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RfkillDesc {
    pub name: &'static str,
    pub kind: RadioType,
    pub default_blocked: bool,
}

/// The callback contract a registered radio must honor.
#[allow(async_fn_in_trait)]
pub trait RfkillOps {
    /// Apply a block (`true`) or unblock (`false`) request.
    async fn set_block(&self, blocked: bool) -> Result<(), Error>;
}

/// A radio-block framework the driver registers into.
pub trait Registry {
    /// Handle to one registered switch. Not `Clone`: it is destroyed once.
    type Registration;

    fn register(&mut self, desc: &RfkillDesc) -> Result<Self::Registration, RegistryError>;

    /// Report the initial hard and soft state.
    fn set_states(&mut self, registration: &Self::Registration, blocked: bool, soft_blocked: bool);

    /// Stop delivering requests for the switch.
    fn unregister(&mut self, registration: &Self::Registration);

    /// Free the switch.
    fn destroy(&mut self, registration: Self::Registration);
}

/// State of one switch in a [`SwitchRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    pub name: String<MAX_NAME_LEN>,
    pub kind: RadioType,
    pub blocked: bool,
    pub soft_blocked: bool,
    pub registered: bool,
}

/// Slot index of a switch in a [`SwitchRegistry`].
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchId(usize);

/// Fixed-capacity registry for targets without a host rfkill framework.
pub struct SwitchRegistry<const N: usize> {
    slots: Vec<Option<Switch>, N>,
}

impl<const N: usize> SwitchRegistry<N> {
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn get(&self, id: &SwitchId) -> Option<&Switch> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Number of live (not destroyed) switches.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_mut(&mut self, id: &SwitchId) -> Option<&mut Switch> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }
}

impl<const N: usize> Default for SwitchRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Registry for SwitchRegistry<N> {
    type Registration = SwitchId;

    fn register(&mut self, desc: &RfkillDesc) -> Result<SwitchId, RegistryError> {
        let name = String::try_from(desc.name).map_err(|_| RegistryError::NameTooLong)?;
        let switch = Switch {
            name,
            kind: desc.kind,
            blocked: desc.default_blocked,
            soft_blocked: desc.default_blocked,
            registered: true,
        };

        if let Some(index) = self.slots.iter().position(Option::is_none) {
            self.slots[index] = Some(switch);
            return Ok(SwitchId(index));
        }

        self.slots
            .push(Some(switch))
            .map_err(|_| RegistryError::Full)?;
        Ok(SwitchId(self.slots.len() - 1))
    }

    fn set_states(&mut self, registration: &SwitchId, blocked: bool, soft_blocked: bool) {
        if let Some(switch) = self.slot_mut(registration) {
            switch.blocked = blocked;
            switch.soft_blocked = soft_blocked;
        }
    }

    fn unregister(&mut self, registration: &SwitchId) {
        if let Some(switch) = self.slot_mut(registration) {
            switch.registered = false;
        }
    }

    fn destroy(&mut self, registration: SwitchId) {
        if let Some(slot) = self.slots.get_mut(registration.0) {
            *slot = None;
        }
    }
}
