//! Timer-gated cycle scheduling.
//!
//! A cycle fires once the cycle stopwatch has run for at least one period; the
//! stopwatch is then restarted from the firing instant. How the scheduler
//! waits in between is a [`Pacing`] choice and does not change when cycles fire.

use embassy_time::{Duration, Instant};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Monotonic time source plus the ability to sleep on it.
#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now(&self) -> Instant;

    async fn sleep_until(&self, deadline: Instant);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    async fn sleep_until(&self, deadline: Instant) {
        (**self).sleep_until(deadline).await
    }
}

/// The embassy time driver.
#[cfg(target_os = "none")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(target_os = "none")]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, deadline: Instant) {
        embassy_time::Timer::at(deadline).await
    }
}

/// Elapsed-time counter that can be reset.
pub struct Stopwatch<'c, C: Clock> {
    clock: &'c C,
    started: Instant,
}

impl<'c, C: Clock> Stopwatch<'c, C> {
    pub fn start(clock: &'c C) -> Self {
        Self {
            clock,
            started: clock.now(),
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started)
    }

    pub fn restart(&mut self) {
        self.started = self.clock.now();
    }
}

/// How the scheduler spends the time between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Pacing {
    /// Spin on the clock without yielding. Only sound when this is the only
    /// task on the executor.
    #[default]
    BusyPoll,
    /// Sleep until the deadline, then re-check the clock.
    Sleep,
}

pub struct PeriodicScheduler<'c, C: Clock> {
    cycle: Stopwatch<'c, C>,
    period: Duration,
    pacing: Pacing,
    fired: u32,
}

impl<'c, C: Clock> PeriodicScheduler<'c, C> {
    /// Starts the cycle stopwatch immediately.
    pub fn new(clock: &'c C, period: Duration, pacing: Pacing) -> Self {
        Self {
            cycle: Stopwatch::start(clock),
            period,
            pacing,
            fired: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of cycles fired so far (wraps).
    pub fn fired(&self) -> u32 {
        self.fired
    }

    /// One check of the gating condition. Returns true, and restarts the cycle
    /// stopwatch, when a cycle is due.
    pub fn poll(&mut self) -> bool {
        if self.cycle.elapsed() < self.period {
            return false;
        }
        self.cycle.restart();
        self.fired = self.fired.wrapping_add(1);
        true
    }

    /// Resolves exactly once per elapsed period.
    pub async fn wait_next(&mut self) {
        loop {
            if self.poll() {
                return;
            }
            if self.pacing == Pacing::Sleep {
                let deadline = self.cycle.started() + self.period;
                self.cycle.clock.sleep_until(deadline).await;
            }
        }
    }
}

const UNBOUNDED: u32 = u32::MAX;

/// Stops a program loop, either on request or after a fixed number of cycles.
pub struct CancelToken {
    cancelled: AtomicBool,
    remaining: AtomicU32,
}

impl CancelToken {
    /// Runs until [`cancel`](Self::cancel) is called.
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            remaining: AtomicU32::new(UNBOUNDED),
        }
    }

    /// Allows `cycles` calls to [`begin_cycle`](Self::begin_cycle), then cancels
    /// itself. `u32::MAX` means no limit.
    pub const fn with_budget(cycles: u32) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            remaining: AtomicU32::new(cycles),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Called at the top of every cycle. False means the loop must stop.
    pub fn begin_cycle(&self) -> bool {
        if self.is_cancelled() {
            return false;
        }
        let taken = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| match left {
                0 | UNBOUNDED => None,
                n => Some(n - 1),
            });
        match taken {
            Ok(_) | Err(UNBOUNDED) => true,
            Err(_) => {
                self.cancel();
                false
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
