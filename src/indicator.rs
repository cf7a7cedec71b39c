use embassy_time::Instant;
use embedded_hal::digital::v2::OutputPin;

/// A single on/off output, usually the board's user LED.
///
/// The logical state is tracked here so toggling does not depend on reading
/// the pin back.
pub struct Indicator<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> Indicator<P> {
    /// Drives the pin to `on` straight away.
    pub fn new(pin: P, on: bool) -> Result<Self, P::Error> {
        let mut indicator = Self { pin, on };
        indicator.set(on)?;
        Ok(indicator)
    }

    pub fn set(&mut self, on: bool) -> Result<(), P::Error> {
        if on {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.on = on;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<(), P::Error> {
        self.set(!self.on)
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn release(self) -> P {
        self.pin
    }
}

/// Whole seconds since a fixed start, advanced at most one second per poll.
///
/// Drives the once-per-second indicator toggle independently of the cycle
/// rate: a toggle is due each time a new integer second has been crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondsCadence {
    start: Instant,
    seconds: u64,
}

impl SecondsCadence {
    pub const fn new(start: Instant) -> Self {
        Self { start, seconds: 0 }
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// True when a toggle is due at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.start).as_secs();
        if elapsed > self.seconds {
            self.seconds += 1;
            true
        } else {
            false
        }
    }
}
