//! Bounded random walk over a fixed set of channels.
//!
//! Each cycle every channel moves by `step_scale * (-1 + 2U)` with `U` uniform
//! on [0, 1]. Nothing pulls the values back: the walk diffuses freely, and the
//! only bound is on the size of a single step.

use rand_core::{impls, Error, RngCore, SeedableRng};

/// Fixed-length channel vector with its step scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomWalk<const N: usize> {
    values: [f32; N],
    step_scale: f32,
}

impl<const N: usize> RandomWalk<N> {
    /// All channels start at zero.
    pub const fn new(step_scale: f32) -> Self {
        Self {
            values: [0.0; N],
            step_scale,
        }
    }

    pub const fn with_values(values: [f32; N], step_scale: f32) -> Self {
        Self { values, step_scale }
    }

    pub fn values(&self) -> &[f32; N] {
        &self.values
    }

    pub fn step_scale(&self) -> f32 {
        self.step_scale
    }

    /// Perturb every channel once, drawing one uniform sample per channel in
    /// channel order.
    pub fn step<R: RngCore + ?Sized>(&mut self, rng: &mut R) {
        for value in self.values.iter_mut() {
            let u = unit_interval(rng);
            *value += self.step_scale * (-1.0 + 2.0 * u);
        }
    }
}

const UNIT_BITS: u32 = 24; // f32 mantissa width, every 24-bit integer is exact
const UNIT_MAX: u32 = (1 << UNIT_BITS) - 1;

/// Uniform sample on the closed interval [0, 1].
pub fn unit_interval<R: RngCore + ?Sized>(rng: &mut R) -> f32 {
    let bits = rng.next_u32() >> (32 - UNIT_BITS);
    bits as f32 / UNIT_MAX as f32
}

/// Xorshift32 (13, 17, 5). Small, fast and reproducible; not for crypto.
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    // xorshift never leaves the all-zero state
    const ZERO_SEED_REPLACEMENT: u32 = 0x9E37_79B9;

    pub const fn new(seed: u32) -> Self {
        let state = if seed == 0 {
            Self::ZERO_SEED_REPLACEMENT
        } else {
            seed
        };
        Self { state }
    }
}

impl RngCore for XorShift32 {
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for XorShift32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// Fold the boot stamp, a clock reading and the chip's unique ID into one seed.
///
/// `boot_stamp` is whatever differs from one boot to the next (RTC calendar
/// time and a persistent boot counter on the board). FNV-1a over every byte.
pub fn seed_from_entropy(boot_stamp: u64, uptime_ticks: u64, device_uid: &[u8]) -> u32 {
    const FNV_OFFSET: u32 = 0x811C_9DC5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let bytes = device_uid
        .iter()
        .copied()
        .chain(boot_stamp.to_le_bytes())
        .chain(uptime_ticks.to_le_bytes());
    bytes.fold(FNV_OFFSET, |hash, byte| {
        (hash ^ byte as u32).wrapping_mul(FNV_PRIME)
    })
}
