//! Power sequencing and rfkill glue for the BCM4330 Bluetooth radio.
//!
//! # Overview
//!
//! The BCM4330 comes out of reset only after a fixed pulse on its shutdown
//! and reset lines, with its 32 kHz sleep clock already running. This crate
//! drives that sequence and exposes the radio as a block/unblock switch:
//! - Power up: clock on, then shutdown and reset each pulsed low/high with a
//!   100 ms settle after every edge
//! - Power down: shutdown low, reset low, clock off, no delays
//! - Unblocking a radio that is already up does nothing
//!
//! On boards where the radio shares SDIO pads with a deep-power-down
//! domain, the pads are taken out of retention for the duration of each
//! transition.
//!
//! # Module Organization
//!
//! - [`sequencer`] - The power state machine
//! - [`driver`] - Attach/detach and the block request entry point
//! - [`retention`] - Shared I/O retention gate
//! - [`rfkill`] - Radio-block registry contract and a fixed-capacity registry
//! - [`line`], [`clock`] - Control line and reference clock handles
//! - [`error`] - Error type and status codes

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod clock;
pub mod driver;
pub mod error;
pub mod line;
pub mod retention;
pub mod rfkill;
pub mod sequencer;

pub use clock::ReferenceClock;
pub use driver::{Bcm4330Rfkill, BoardConfig, Platform, Resource};
pub use error::{Error, status_code};
pub use line::LineId;
pub use retention::{DeepPowerDown, NoRetention, Retention, RetentionGate};
pub use rfkill::{RadioType, Registry, RegistryError, RfkillOps, SwitchRegistry};
pub use sequencer::{PowerSequencer, PowerState, SETTLE_MS};
