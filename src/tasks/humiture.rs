use embedded_hal::digital::v2::OutputPin;
use embedded_io_async::Write;

use crate::config::{ConfigError, PollConfig};
use crate::drivers::sensor::HumitureSensor;
use crate::emitter::LineEmitter;
use crate::indicator::Indicator;
use crate::scheduler::{CancelToken, Clock};

/// Read counters. Kept for the log only; nothing here reaches the serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct PollStats {
    pub reads: u32,
    pub failures: u32,
    pub consecutive_failures: u32,
    /// Readings that could not be written out.
    pub write_failures: u32,
}

/// The sensor polling program: blink, wait, blink, read, print.
pub struct HumitureTelemetry<S, W, P> {
    pub sensor: S,
    pub serial: LineEmitter<W>,
    pub led: Indicator<P>,
    stats: PollStats,
}

impl<S, W, P> HumitureTelemetry<S, W, P>
where
    S: HumitureSensor,
    W: Write,
    P: OutputPin,
{
    pub fn new(sensor: S, serial: LineEmitter<W>, led: Indicator<P>) -> Self {
        Self {
            sensor,
            serial,
            led,
            stats: PollStats::default(),
        }
    }

    pub fn stats(&self) -> PollStats {
        self.stats
    }

    /// Polls until `cancel` fires.
    ///
    /// A failed read prints nothing for that cycle; the next cycle starts as
    /// usual with no retry or backoff.
    pub async fn run<C: Clock>(
        &mut self,
        clock: &C,
        config: &PollConfig,
        cancel: &CancelToken,
    ) -> Result<PollStats, ConfigError> {
        config.validate()?;
        info!("humiture poll every {} ms", config.wait.as_millis());

        while cancel.begin_cycle() {
            self.blink();
            clock.sleep_until(clock.now() + config.wait).await;
            self.blink();

            self.poll_once().await;
        }

        info!(
            "humiture stopped: {} reads, {} failed, {} unwritten",
            self.stats.reads,
            self.stats.failures,
            self.stats.write_failures
        );
        Ok(self.stats)
    }

    /// One read attempt; prints the reading if there is one.
    pub async fn poll_once(&mut self) {
        self.stats.reads = self.stats.reads.wrapping_add(1);

        match self.sensor.read().await {
            Ok(reading) => {
                if self.stats.consecutive_failures > 0 {
                    info!(
                        "sensor recovered after {} failed reads",
                        self.stats.consecutive_failures
                    );
                    self.stats.consecutive_failures = 0;
                }
                debug!(
                    "temperature {} C, humidity {} %",
                    reading.temperature_c,
                    reading.humidity
                );
                if self.serial.emit(&reading.channels()).await.is_err() {
                    self.stats.write_failures = self.stats.write_failures.wrapping_add(1);
                    if self.stats.write_failures % 10 == 1 {
                        warn!("serial write failed ({} total)", self.stats.write_failures);
                    }
                }
            }
            Err(_) => {
                self.stats.failures = self.stats.failures.wrapping_add(1);
                self.stats.consecutive_failures = self.stats.consecutive_failures.wrapping_add(1);
                if self.stats.consecutive_failures % 10 == 1 {
                    warn!(
                        "sensor read failed ({} in a row)",
                        self.stats.consecutive_failures
                    );
                }
            }
        }
    }

    fn blink(&mut self) {
        if self.led.toggle().is_err() {
            warn!("indicator write failed");
        }
    }
}

#[cfg(target_os = "none")]
#[embassy_executor::task]
pub async fn humiture_task(
    sensor: crate::drivers::Dht22,
    serial: embassy_stm32::usart::UartTx<'static, embassy_stm32::mode::Async>,
    led: embassy_stm32::gpio::Output<'static>,
) {
    use crate::scheduler::SystemClock;

    static CANCEL: CancelToken = CancelToken::new();

    let config = PollConfig::default();
    let led = Indicator::new(led, false).unwrap();
    let mut program = HumitureTelemetry::new(sensor, LineEmitter::new(serial), led);

    info!("humiture task started");
    if let Err(e) = program.run(&SystemClock, &config, &CANCEL).await {
        error!("humiture config rejected: {:?}", e);
    }
}
