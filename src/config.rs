use embassy_time::Duration;

use crate::scheduler::Pacing;

// Centralize all configuration constants
pub const WALK_CHANNELS: usize = 3;
pub const WALK_STEP_SCALE: f32 = 0.05;
pub const WALK_SAMPLE_RATE_HZ: u64 = 100;

pub const HUMITURE_CHANNELS: usize = 2;
pub const HUMITURE_POLL_WAIT_MS: u64 = 2_100;

pub const UART_BAUDRATE: u32 = 115_200;

// "-1234567.8901 " is 14 bytes; 8 channels of that fit with room to spare.
pub const LINE_CAPACITY: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum ConfigError {
    ZeroSampleRate,
    InvalidStepScale,
    ZeroWait,
}

/// Parameters of the random-walk program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkConfig {
    /// Largest perturbation a channel can take in one cycle.
    pub step_scale: f32,
    pub sample_rate_hz: u64,
    pub pacing: Pacing,
}

impl WalkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        // also rejects NaN
        if !(self.step_scale >= 0.0 && self.step_scale.is_finite()) {
            return Err(ConfigError::InvalidStepScale);
        }
        Ok(())
    }

    /// Target cycle period, `1 / sample_rate_hz`.
    pub fn period(&self) -> Result<Duration, ConfigError> {
        self.validate()?;
        Ok(Duration::from_hz(self.sample_rate_hz))
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            step_scale: WALK_STEP_SCALE,
            sample_rate_hz: WALK_SAMPLE_RATE_HZ,
            pacing: Pacing::BusyPoll,
        }
    }
}

/// Parameters of the sensor polling program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time the indicator spends in its first toggled state before each read.
    pub wait: Duration,
}

impl PollConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wait.as_ticks() == 0 {
            return Err(ConfigError::ZeroWait);
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            wait: Duration::from_millis(HUMITURE_POLL_WAIT_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo_parameters() {
        let walk = WalkConfig::default();
        assert_eq!(walk.step_scale, 0.05);
        assert_eq!(walk.sample_rate_hz, 100);
        assert_eq!(walk.pacing, Pacing::BusyPoll);
        assert_eq!(walk.period(), Ok(Duration::from_hz(100)));

        let poll = PollConfig::default();
        assert_eq!(poll.wait, Duration::from_millis(2_100));
        assert_eq!(poll.validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_rate() {
        let cfg = WalkConfig {
            sample_rate_hz: 0,
            ..WalkConfig::default()
        };
        assert_eq!(cfg.period(), Err(ConfigError::ZeroSampleRate));
    }

    #[test]
    fn rejects_bad_step_scale() {
        for scale in [-0.1, f32::NAN, f32::INFINITY] {
            let cfg = WalkConfig {
                step_scale: scale,
                ..WalkConfig::default()
            };
            assert_eq!(cfg.validate(), Err(ConfigError::InvalidStepScale));
        }
        let frozen = WalkConfig {
            step_scale: 0.0,
            ..WalkConfig::default()
        };
        assert_eq!(frozen.validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_wait() {
        let cfg = PollConfig {
            wait: Duration::from_ticks(0),
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroWait));
    }
}
