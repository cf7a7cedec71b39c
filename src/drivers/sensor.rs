use crate::config::HUMITURE_CHANNELS;

/// One temperature + relative humidity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct Humiture {
    pub temperature_c: f32,
    /// Relative humidity, percent.
    pub humidity: f32,
}

impl Humiture {
    /// Channel order on the serial line.
    pub fn channels(&self) -> [f32; HUMITURE_CHANNELS] {
        [self.temperature_c, self.humidity]
    }
}

/// Anything that can produce a [`Humiture`] reading on demand.
#[allow(async_fn_in_trait)]
pub trait HumitureSensor {
    type Error;

    async fn read(&mut self) -> Result<Humiture, Self::Error>;
}
