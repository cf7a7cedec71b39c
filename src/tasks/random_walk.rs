use embedded_hal::digital::v2::OutputPin;
use embedded_io_async::Write;
use rand_core::RngCore;

use crate::config::{ConfigError, WalkConfig};
use crate::emitter::LineEmitter;
use crate::indicator::{Indicator, SecondsCadence};
use crate::scheduler::{CancelToken, Clock, PeriodicScheduler};
use crate::walk::RandomWalk;

/// Everything the random-walk program owns: the channel vector, its entropy
/// source, the serial line and the indicator.
pub struct WalkTelemetry<const N: usize, R, W, P> {
    pub walk: RandomWalk<N>,
    pub rng: R,
    pub serial: LineEmitter<W>,
    pub led: Indicator<P>,
    write_failures: u32,
}

impl<const N: usize, R, W, P> WalkTelemetry<N, R, W, P>
where
    R: RngCore,
    W: Write,
    P: OutputPin,
{
    pub fn new(walk: RandomWalk<N>, rng: R, serial: LineEmitter<W>, led: Indicator<P>) -> Self {
        Self {
            walk,
            rng,
            serial,
            led,
            write_failures: 0,
        }
    }

    pub fn write_failures(&self) -> u32 {
        self.write_failures
    }

    /// Streams the walk until `cancel` fires; returns the number of cycles run.
    ///
    /// The starting vector goes out once before the first cycle. Each cycle
    /// then steps the walk, toggles the indicator if a new whole second has
    /// started, and emits the vector.
    pub async fn run<C: Clock>(
        &mut self,
        clock: &C,
        config: &WalkConfig,
        cancel: &CancelToken,
    ) -> Result<u32, ConfigError> {
        let period = config.period()?;

        self.emit().await;

        let mut seconds = SecondsCadence::new(clock.now());
        let mut scheduler = PeriodicScheduler::new(clock, period, config.pacing);
        info!(
            "random walk: {} channels, scale {}, period {} us",
            N,
            self.walk.step_scale(),
            scheduler.period().as_micros()
        );

        while cancel.begin_cycle() {
            scheduler.wait_next().await;

            self.walk.step(&mut self.rng);

            if seconds.poll(clock.now()) && self.led.toggle().is_err() {
                warn!("indicator write failed at {}s", seconds.seconds());
            }

            self.emit().await;
        }

        info!(
            "random walk stopped after {} cycles, {} failed writes",
            scheduler.fired(),
            self.write_failures
        );
        Ok(scheduler.fired())
    }

    async fn emit(&mut self) {
        if self.serial.emit(self.walk.values()).await.is_err() {
            self.write_failures = self.write_failures.wrapping_add(1);
            if self.write_failures % 100 == 1 {
                warn!("serial write failed ({} total)", self.write_failures);
            }
        }
    }
}

#[cfg(target_os = "none")]
#[embassy_executor::task]
pub async fn random_walk_task(
    serial: embassy_stm32::usart::UartTx<'static, embassy_stm32::mode::Async>,
    led: embassy_stm32::gpio::Output<'static>,
    seed: u32,
) {
    use crate::config::WALK_CHANNELS;
    use crate::scheduler::SystemClock;
    use crate::walk::XorShift32;

    static CANCEL: CancelToken = CancelToken::new();

    let config = WalkConfig::default();
    let led = Indicator::new(led, false).unwrap();
    let mut program = WalkTelemetry::new(
        RandomWalk::<WALK_CHANNELS>::new(config.step_scale),
        XorShift32::new(seed),
        LineEmitter::new(serial),
        led,
    );

    info!("random walk task started, seed {}", seed);
    if let Err(e) = program.run(&SystemClock, &config, &CANCEL).await {
        error!("random walk config rejected: {:?}", e);
    }
}
