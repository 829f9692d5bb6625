//! MCP3008 8-channel, 10-bit ADC on a bit-banged SPI bus.

/// Largest code the converter produces.
pub const FULL_SCALE: u16 = 1023;

/// Five-bit request clocked out MSB first: start bit, single-ended flag, then
/// the three channel select bits.
pub fn request_bits(channel: u8) -> u8 {
    0b11000 | (channel & 0b111)
}

/// Extracts the conversion result from the twelve bits clocked in after a
/// request (one empty bit, one null bit, ten data bits, MSB first).
pub fn response_code(raw: u16) -> u16 {
    (raw >> 1) & FULL_SCALE
}

pub fn code_to_fraction(code: u16) -> f64 {
    code.min(FULL_SCALE) as f64 / FULL_SCALE as f64
}

#[cfg(feature = "rpi")]
pub use self::hardware::Mcp3008;

#[cfg(feature = "rpi")]
mod hardware {
    use anyhow::{ensure, Context};
    use log::trace;
    use rppal::gpio::{Gpio, InputPin, OutputPin};

    use super::*;
    use crate::{interface::Mcp3008Pins, AnalogInput};

    pub struct Mcp3008 {
        clock: OutputPin,
        mosi: OutputPin,
        miso: InputPin,
        select: OutputPin,
    }

    impl Mcp3008 {
        pub fn new(gpio: &Gpio, pins: Mcp3008Pins) -> anyhow::Result<Self> {
            let pin = |pin: u8, name: &str| {
                gpio.get(pin)
                    .with_context(|| format!("failed to access mcp3008 {name} pin {pin}"))
            };

            Ok(Self {
                clock: pin(pins.clock, "clock")?.into_output_low(),
                mosi: pin(pins.mosi, "mosi")?.into_output_low(),
                miso: pin(pins.miso, "miso")?.into_input(),
                select: pin(pins.select, "select")?.into_output_high(),
            })
        }

        fn pulse(&mut self) {
            self.clock.set_high();
            self.clock.set_low();
        }
    }

    impl AnalogInput for Mcp3008 {
        fn read_channel(&mut self, channel: u8) -> anyhow::Result<f64> {
            ensure!(channel < 8, "mcp3008 has no channel {channel}");

            self.select.set_high();
            self.clock.set_low();
            self.select.set_low();

            let request = request_bits(channel);
            for bit in (0..5).rev() {
                if request >> bit & 1 == 1 {
                    self.mosi.set_high();
                } else {
                    self.mosi.set_low();
                }
                self.pulse();
            }

            let mut raw = 0u16;
            for _ in 0..12 {
                self.pulse();
                raw <<= 1;
                if self.miso.is_high() {
                    raw |= 1;
                }
            }

            self.select.set_high();

            let code = response_code(raw);
            trace!("mcp3008 channel {channel}: {code}");

            Ok(code_to_fraction(code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_selects_channel() {
        assert_eq!(request_bits(0), 0b11000);
        assert_eq!(request_bits(5), 0b11101);
    }

    #[test]
    fn response_drops_trailing_null_bit() {
        // empty bit, ten data bits of full scale, null bit
        assert_eq!(response_code(0b0111_1111_1110), FULL_SCALE);
        assert_eq!(response_code(0b0000_0000_0010), 1);
    }

    #[test]
    fn codes_map_onto_unit_interval() {
        assert_eq!(code_to_fraction(0), 0.0);
        assert_eq!(code_to_fraction(FULL_SCALE), 1.0);
        assert_eq!(code_to_fraction(4096), 1.0);
    }
}
