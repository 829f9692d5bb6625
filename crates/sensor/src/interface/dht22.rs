//! DHT22 / AM2302 temperature and humidity sensor on a single GPIO line.

use anyhow::ensure;

/// Decodes the five bytes the sensor sends after a start signal into
/// `(temperature °C, humidity %)`.
///
/// Layout: humidity high/low, temperature high/low, checksum. Both values are
/// tenths; the top bit of the temperature is its sign.
pub fn decode_frame(frame: [u8; 5]) -> anyhow::Result<(f64, f64)> {
    let sum = frame[..4]
        .iter()
        .fold(0u8, |acc, byte| acc.wrapping_add(*byte));

    ensure!(
        sum == frame[4],
        "dht22 checksum mismatch (expected {:#04x}, got {:#04x})",
        sum,
        frame[4]
    );

    let humidity = u16::from_be_bytes([frame[0], frame[1]]) as f64 / 10.0;
    let magnitude = u16::from_be_bytes([frame[2] & 0x7f, frame[3]]) as f64 / 10.0;
    let temperature = if frame[2] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    };

    Ok((temperature, humidity))
}

#[cfg(feature = "rpi")]
pub use self::hardware::Dht22;

#[cfg(feature = "rpi")]
mod hardware {
    use std::{
        thread,
        time::{Duration, Instant},
    };

    use anyhow::{bail, Context};
    use log::trace;
    use rppal::gpio::{Gpio, IoPin, Level, Mode, PullUpDown};

    use super::decode_frame;
    use crate::EnvironmentSensor;

    /// Longest time the line is expected to stay at one level.
    const EDGE_TIMEOUT: Duration = Duration::from_micros(120);

    /// A high pulse longer than this is a one bit (26-28 µs for zero, 70 µs
    /// for one).
    const ONE_THRESHOLD: Duration = Duration::from_micros(48);

    pub struct Dht22 {
        pin: IoPin,
        last: Option<(f64, f64)>,
    }

    impl Dht22 {
        pub fn new(gpio: &Gpio, pin: u8) -> anyhow::Result<Self> {
            let mut pin = gpio
                .get(pin)
                .with_context(|| format!("failed to access dht22 gpio pin {pin}"))?
                .into_io(Mode::Input);
            pin.set_pullupdown(PullUpDown::PullUp);

            Ok(Self { pin, last: None })
        }

        fn wait_for(&self, level: Level) -> anyhow::Result<Duration> {
            let start = Instant::now();

            while self.pin.read() != level {
                if start.elapsed() > EDGE_TIMEOUT {
                    bail!("timed out waiting for dht22 line to go {level:?}");
                }
            }

            Ok(start.elapsed())
        }

        fn capture(&mut self) -> anyhow::Result<[u8; 5]> {
            // start signal: hold the line low for at least 1 ms, then release it
            self.pin.set_mode(Mode::Output);
            self.pin.set_low();
            thread::sleep(Duration::from_millis(2));
            self.pin.set_high();
            self.pin.set_mode(Mode::Input);

            // response: 80 µs low, 80 µs high
            self.wait_for(Level::Low).context("sensor did not respond")?;
            self.wait_for(Level::High).context("sensor did not respond")?;
            self.wait_for(Level::Low).context("sensor did not respond")?;

            let mut frame = [0u8; 5];

            for bit in 0..40 {
                self.wait_for(Level::High)
                    .with_context(|| format!("lost sync before bit {bit}"))?;
                let high = self
                    .wait_for(Level::Low)
                    .with_context(|| format!("lost sync during bit {bit}"))?;

                if high > ONE_THRESHOLD {
                    frame[bit / 8] |= 0x80 >> (bit % 8);
                }
            }

            trace!("dht22 frame: {frame:02x?}");

            Ok(frame)
        }
    }

    impl EnvironmentSensor for Dht22 {
        fn trigger(&mut self) -> anyhow::Result<()> {
            self.last = None;
            let frame = self.capture()?;
            self.last = Some(decode_frame(frame)?);
            Ok(())
        }

        fn temperature(&mut self) -> anyhow::Result<f64> {
            self.last
                .map(|(temperature, _)| temperature)
                .context("dht22 has no valid reading")
        }

        fn humidity(&mut self) -> anyhow::Result<f64> {
            self.last
                .map(|(_, humidity)| humidity)
                .context("dht22 has no valid reading")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_checksum(bytes: [u8; 4]) -> [u8; 5] {
        let sum = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        [bytes[0], bytes[1], bytes[2], bytes[3], sum]
    }

    #[test]
    fn decodes_positive_temperature() {
        // 65.2 %, 35.1 °C
        let (temperature, humidity) =
            decode_frame(with_checksum([0x02, 0x8c, 0x01, 0x5f])).unwrap();
        assert_eq!(humidity, 65.2);
        assert_eq!(temperature, 35.1);
    }

    #[test]
    fn decodes_negative_temperature() {
        // -10.1 °C
        let (temperature, _) = decode_frame(with_checksum([0x01, 0xf4, 0x80, 0x65])).unwrap();
        assert_eq!(temperature, -10.1);
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut frame = with_checksum([0x02, 0x8c, 0x01, 0x5f]);
        frame[4] = frame[4].wrapping_add(1);

        let err = decode_frame(frame).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }
}
