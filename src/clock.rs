//! 32 kHz reference clock fed to the radio's sleep clock input.

/// A gateable reference clock.
///
/// `enable` and `disable` set the gate level; calling either twice in a row
/// is harmless. Both are infallible once the clock has been acquired.
pub trait ReferenceClock {
    fn enable(&mut self);
    fn disable(&mut self);
}
