//! DHT22 / AM2302 temperature + humidity sensor
//! ===========================================================
//!
//! Single-wire, open-drain bus with a pull-up. The host pulls the line low for
//! at least 1 ms, releases it, and the sensor answers with an 80 us low /
//! 80 us high preamble followed by 40 data bits. Every bit is a ~50 us low
//! pulse followed by a high pulse of ~27 us (`0`) or ~70 us (`1`).
//!
//! Bits are classified by comparing each high pulse against the low pulse in
//! front of it, both measured in spin-loop iterations, so no microsecond timer
//! is needed (the Cortex-M0+ has no cycle counter).

use super::sensor::Humiture;

pub const FRAME_BYTES: usize = 5;
pub const FRAME_BITS: usize = FRAME_BYTES * 8;

/// The sensor refuses to convert more often than this.
pub const MIN_READ_INTERVAL_MS: u64 = 2_000;

const SIGN_BIT: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Dht22Error {
    /// The sensor never pulled the line low after the start signal.
    NoResponse,
    /// The line stopped toggling in the middle of the preamble or a bit.
    Timeout,
    BadChecksum,
}

/// One bit as seen on the wire: spin counts of its low and high phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitPulse {
    pub low: u32,
    pub high: u32,
}

impl BitPulse {
    /// A `1` has a high phase longer than the 50 us low phase; a `0` shorter.
    pub fn value(&self) -> bool {
        self.high > self.low
    }
}

/// Pack 40 measured bits, MSB first, into the raw frame.
pub fn pack_bits(pulses: &[BitPulse; FRAME_BITS]) -> [u8; FRAME_BYTES] {
    let mut frame = [0u8; FRAME_BYTES];
    for (i, pulse) in pulses.iter().enumerate() {
        frame[i / 8] <<= 1;
        if pulse.value() {
            frame[i / 8] |= 1;
        }
    }
    frame
}

/// Validate and decode a raw frame.
///
/// Layout: humidity (u16, tenths of a percent), temperature (sign-magnitude,
/// tenths of a degree), checksum (low byte of the sum of the first four).
pub fn decode_frame(frame: [u8; FRAME_BYTES]) -> Result<Humiture, Dht22Error> {
    let sum = frame[..4].iter().fold(0u8, |a, &b| a.wrapping_add(b));
    if sum != frame[4] {
        return Err(Dht22Error::BadChecksum);
    }

    let humidity = u16::from_be_bytes([frame[0], frame[1]]) as f32 / 10.0;
    let magnitude = u16::from_be_bytes([frame[2] & !SIGN_BIT, frame[3]]) as f32 / 10.0;
    let temperature_c = if frame[2] & SIGN_BIT != 0 {
        -magnitude
    } else {
        magnitude
    };

    Ok(Humiture {
        temperature_c,
        humidity,
    })
}

#[cfg(target_os = "none")]
pub use bus::Dht22;

#[cfg(target_os = "none")]
mod bus {
    use super::*;
    use crate::drivers::sensor::HumitureSensor;
    use embassy_stm32::gpio::{Flex, Speed};
    use embassy_time::{Duration, Instant, Timer};

    const START_LOW_MS: u64 = 2;
    // several hundred us of spinning at 64 MHz, far above any valid pulse
    const MAX_SPINS: u32 = 4_000;

    pub struct Dht22 {
        pin: Flex<'static>,
        last_read: Option<Instant>,
    }

    impl Dht22 {
        pub fn new(mut pin: Flex<'static>) -> Self {
            pin.set_high();
            pin.set_as_input_output(Speed::Low);
            Self {
                pin,
                last_read: None,
            }
        }

        /* ================= low‑level line helpers ========================= */

        /// Spin while the line sits at `level`; returns the iteration count.
        fn pulse_len(&self, level: bool) -> Option<u32> {
            let mut spins = 0u32;
            while self.pin.is_high() == level {
                spins += 1;
                if spins >= MAX_SPINS {
                    return None;
                }
            }
            Some(spins)
        }

        fn read_frame_blocking(&mut self) -> Result<[u8; FRAME_BYTES], Dht22Error> {
            let mut pulses = [BitPulse::default(); FRAME_BITS];

            // Timing-critical: no interrupts until the last bit is in.
            cortex_m::interrupt::free(|_| -> Result<(), Dht22Error> {
                self.pin.set_high();

                // release -> sensor pulls low within ~40 us
                self.pulse_len(true).ok_or(Dht22Error::NoResponse)?;
                // preamble: 80 us low, 80 us high
                self.pulse_len(false).ok_or(Dht22Error::Timeout)?;
                self.pulse_len(true).ok_or(Dht22Error::Timeout)?;

                for pulse in pulses.iter_mut() {
                    pulse.low = self.pulse_len(false).ok_or(Dht22Error::Timeout)?;
                    pulse.high = self.pulse_len(true).ok_or(Dht22Error::Timeout)?;
                }
                Ok(())
            })?;

            Ok(pack_bits(&pulses))
        }

        /* ================= public API ============================ */

        pub async fn read_humiture(&mut self) -> Result<Humiture, Dht22Error> {
            if let Some(last) = self.last_read {
                Timer::at(last + Duration::from_millis(MIN_READ_INTERVAL_MS)).await;
            }

            // start signal
            self.pin.set_low();
            Timer::after_millis(START_LOW_MS).await;

            let frame = self.read_frame_blocking();
            self.pin.set_high();
            self.last_read = Some(Instant::now());

            decode_frame(frame?)
        }
    }

    impl HumitureSensor for Dht22 {
        type Error = Dht22Error;

        async fn read(&mut self) -> Result<Humiture, Self::Error> {
            self.read_humiture().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulses_for(frame: [u8; FRAME_BYTES]) -> [BitPulse; FRAME_BITS] {
        let mut pulses = [BitPulse::default(); FRAME_BITS];
        for (i, pulse) in pulses.iter_mut().enumerate() {
            let bit = frame[i / 8] & (0x80 >> (i % 8)) != 0;
            // roughly what the spin loop sees: 50 us low, 27 / 70 us high
            *pulse = BitPulse {
                low: 100,
                high: if bit { 140 } else { 54 },
            };
        }
        pulses
    }

    fn assert_close(got: f32, want: f32) {
        assert!((got - want).abs() < 1e-4, "got {got}, want {want}");
    }

    #[test]
    fn decodes_datasheet_example() {
        // 65.2 %RH, 35.1 C
        let frame = [0x02, 0x8C, 0x01, 0x5F, 0xEE];
        let reading = decode_frame(frame).unwrap();
        assert_close(reading.humidity, 65.2);
        assert_close(reading.temperature_c, 35.1);
    }

    #[test]
    fn decodes_negative_temperature() {
        // -10.1 C, 45.0 %RH; 0x01 + 0xC2 + 0x80 + 0x65 = 0x1A8
        let frame = [0x01, 0xC2, 0x80, 0x65, 0xA8];
        let reading = decode_frame(frame).unwrap();
        assert_close(reading.temperature_c, -10.1);
        assert_close(reading.humidity, 45.0);
    }

    #[test]
    fn rejects_bad_checksum() {
        let frame = [0x02, 0x8C, 0x01, 0x5F, 0xEF];
        assert_eq!(decode_frame(frame), Err(Dht22Error::BadChecksum));
    }

    #[test]
    fn checksum_wraps_at_one_byte() {
        let frame = [0xFF, 0xFF, 0x00, 0x03, 0x01];
        let reading = decode_frame(frame).unwrap();
        assert_close(reading.humidity, 6553.5);
        assert_close(reading.temperature_c, 0.3);
    }

    #[test]
    fn packs_bits_msb_first() {
        let frame = [0x02, 0x8C, 0x01, 0x5F, 0xEE];
        assert_eq!(pack_bits(&pulses_for(frame)), frame);
    }

    #[test]
    fn bit_value_compares_phases() {
        assert!(BitPulse { low: 50, high: 70 }.value());
        assert!(!BitPulse { low: 50, high: 27 }.value());
        assert!(!BitPulse { low: 50, high: 50 }.value());
    }

    #[test]
    fn channels_are_temperature_then_humidity() {
        let reading = decode_frame([0x02, 0x8C, 0x01, 0x5F, 0xEE]).unwrap();
        let [t, h] = reading.channels();
        assert_close(t, 35.1);
        assert_close(h, 65.2);
    }
}
