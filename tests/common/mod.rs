//! Recording fakes for the platform, registry and timing collaborators.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::rc::Rc;

use bcm4330_rfkill::driver::{CLOCK_32K, NRESET_GPIO, NSHUTDOWN_GPIO};
use bcm4330_rfkill::rfkill::RfkillDesc;
use bcm4330_rfkill::{
    Bcm4330Rfkill, DeepPowerDown, LineId, Platform, ReferenceClock, Registry, RegistryError,
    Resource, RetentionGate,
};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use embedded_hal_async::delay::DelayNs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Drive { line: u32, high: bool },
    Delay { ms: u32 },
    ClockOn,
    ClockOff,
    RetentionOff,
    RetentionOn,
    ClockGet,
    ClockPut,
    GpioRequest(u32),
    GpioFree(u32),
    Register(&'static str),
    SetStates { blocked: bool, soft_blocked: bool },
    Unregister,
    Destroy,
}

/// Shared, time-stamped event log. Time only advances through [`VirtualDelay`].
#[derive(Clone, Default)]
pub struct Log {
    events: Rc<RefCell<Vec<(u64, Event)>>>,
    now_ms: Rc<Cell<u64>>,
}

impl Log {
    pub fn push(&self, event: Event) {
        self.events.borrow_mut().push((self.now_ms.get(), event));
    }

    pub fn advance(&self, ms: u32) {
        self.now_ms.set(self.now_ms.get() + u64::from(ms));
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().iter().map(|(_, e)| *e).collect()
    }

    pub fn stamped(&self) -> Vec<(u64, Event)> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.borrow().iter().filter(|(_, e)| e == event).count()
    }

    /// Events that change hardware: line drives and clock gating.
    pub fn hardware(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::Drive { .. } | Event::ClockOn | Event::ClockOff))
            .collect()
    }
}

pub struct FakePin {
    line: u32,
    high: bool,
    log: Log,
}

impl ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        self.log.push(Event::Drive { line: self.line, high: false });
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        self.log.push(Event::Drive { line: self.line, high: true });
        Ok(())
    }
}

impl StatefulOutputPin for FakePin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }
}

pub struct FakeClock {
    log: Log,
}

impl ReferenceClock for FakeClock {
    fn enable(&mut self) {
        self.log.push(Event::ClockOn);
    }

    fn disable(&mut self) {
        self.log.push(Event::ClockOff);
    }
}

pub struct FakePads {
    log: Log,
}

impl FakePads {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone() }
    }
}

impl DeepPowerDown for FakePads {
    fn enable(&mut self) {
        self.log.push(Event::RetentionOn);
    }

    fn disable(&mut self) {
        self.log.push(Event::RetentionOff);
    }
}

pub type Gate = RetentionGate<NoopRawMutex, FakePads>;

/// Delay that advances the log's virtual clock and yields once, so joined
/// callers get a chance to interleave.
pub struct VirtualDelay {
    log: Log,
}

impl VirtualDelay {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone() }
    }

    async fn wait(&mut self, ms: u32) {
        self.log.push(Event::Delay { ms });
        self.log.advance(ms);
        embassy_futures::yield_now().await;
    }
}

impl DelayNs for VirtualDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.wait(ns / 1_000_000).await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.wait(us / 1_000).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.wait(ms).await;
    }
}

/// A board with a set of wired GPIO lines and an optional 32 kHz clock.
pub struct FakePlatform {
    log: Log,
    wired: BTreeSet<u32>,
    has_clock: bool,
    held_lines: BTreeSet<u32>,
    clock_held: bool,
}

impl FakePlatform {
    pub fn new(log: &Log, wired: &[u32], has_clock: bool) -> Self {
        Self {
            log: log.clone(),
            wired: wired.iter().copied().collect(),
            has_clock,
            held_lines: BTreeSet::new(),
            clock_held: false,
        }
    }

    /// Nothing acquired is still outstanding.
    pub fn all_released(&self) -> bool {
        self.held_lines.is_empty() && !self.clock_held
    }

    pub fn held_lines(&self) -> Vec<u32> {
        self.held_lines.iter().copied().collect()
    }

    pub fn clock_held(&self) -> bool {
        self.clock_held
    }
}

impl Platform for FakePlatform {
    type Pin = FakePin;
    type Clock = FakeClock;

    fn clock_get(&mut self, name: &str) -> Option<FakeClock> {
        if name != CLOCK_32K || !self.has_clock || self.clock_held {
            return None;
        }
        self.clock_held = true;
        self.log.push(Event::ClockGet);
        Some(FakeClock { log: self.log.clone() })
    }

    fn clock_put(&mut self, _clock: FakeClock) {
        assert!(self.clock_held, "clock released twice");
        self.clock_held = false;
        self.log.push(Event::ClockPut);
    }

    fn gpio_request(&mut self, line: LineId, _label: &'static str) -> Option<FakePin> {
        let n = line.number();
        if !self.wired.contains(&n) || !self.held_lines.insert(n) {
            return None;
        }
        self.log.push(Event::GpioRequest(n));
        Some(FakePin {
            line: n,
            high: false,
            log: self.log.clone(),
        })
    }

    fn gpio_free(&mut self, line: LineId, _pin: FakePin) {
        let n = line.number();
        assert!(self.held_lines.remove(&n), "gpio {} freed twice", n);
        self.log.push(Event::GpioFree(n));
    }
}

/// Registry that records calls and can be told to refuse registration.
pub struct FakeRegistry {
    log: Log,
    refuse: bool,
    next: u32,
    pub live: BTreeSet<u32>,
    pub default_blocked: Option<bool>,
    pub states: Option<(bool, bool)>,
}

impl FakeRegistry {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            refuse: false,
            next: 1,
            live: BTreeSet::new(),
            default_blocked: None,
            states: None,
        }
    }

    pub fn refusing(log: &Log) -> Self {
        Self {
            refuse: true,
            ..Self::new(log)
        }
    }
}

impl Registry for FakeRegistry {
    type Registration = u32;

    fn register(&mut self, desc: &RfkillDesc) -> Result<u32, RegistryError> {
        if self.refuse {
            return Err(RegistryError::Full);
        }
        let id = self.next;
        self.next += 1;
        self.live.insert(id);
        self.default_blocked = Some(desc.default_blocked);
        self.log.push(Event::Register(desc.name));
        Ok(id)
    }

    fn set_states(&mut self, _registration: &u32, blocked: bool, soft_blocked: bool) {
        self.states = Some((blocked, soft_blocked));
        self.log.push(Event::SetStates { blocked, soft_blocked });
    }

    fn unregister(&mut self, _registration: &u32) {
        self.log.push(Event::Unregister);
    }

    fn destroy(&mut self, registration: u32) {
        assert!(self.live.remove(&registration), "registration destroyed twice");
        self.log.push(Event::Destroy);
    }
}

pub type TestRfkill<'a> = Bcm4330Rfkill<NoopRawMutex, FakePlatform, VirtualDelay, &'a Gate, FakeRegistry>;

pub const RESET: u32 = 17;
pub const SHUTDOWN: u32 = 23;

/// Board resources naming `reset` and `shutdown`; 0 means not wired.
pub fn resources(reset: u32, shutdown: u32) -> [Resource; 2] {
    [
        Resource {
            name: NRESET_GPIO,
            line: reset,
        },
        Resource {
            name: NSHUTDOWN_GPIO,
            line: shutdown,
        },
    ]
}

/// The full pulse a present line goes through on power-up.
pub fn pulse(line: u32) -> [Event; 4] {
    [
        Event::Drive { line, high: false },
        Event::Delay { ms: 100 },
        Event::Drive { line, high: true },
        Event::Delay { ms: 100 },
    ]
}
