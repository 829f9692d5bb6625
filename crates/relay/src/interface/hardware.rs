use std::collections::HashMap;

use anyhow::Context;
use log::debug;
use rppal::gpio::{Gpio, OutputPin};

use super::{GpioInterface, Level};

pub struct HardwareGpioInterface {
    gpio: Gpio,
    pins: HashMap<u8, OutputPin>,
}

impl HardwareGpioInterface {
    pub fn new() -> anyhow::Result<Self> {
        let gpio = Gpio::new().context("failed to access gpio")?;

        Ok(Self {
            gpio,
            pins: HashMap::new(),
        })
    }

    fn pin(&mut self, pin: u8) -> anyhow::Result<&mut OutputPin> {
        self.pins
            .get_mut(&pin)
            .with_context(|| format!("gpio pin {pin} is not configured as an output"))
    }
}

impl GpioInterface for HardwareGpioInterface {
    fn set_output(&mut self, pin: u8) -> anyhow::Result<()> {
        let output = self
            .gpio
            .get(pin)
            .with_context(|| format!("failed to access gpio pin {pin}"))?
            .into_output_low();

        debug!("configured gpio pin {pin} as output");

        self.pins.insert(pin, output);

        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> anyhow::Result<()> {
        let output = self.pin(pin)?;

        match level {
            Level::Low => output.set_low(),
            Level::High => output.set_high(),
        }

        Ok(())
    }

    fn read(&mut self, pin: u8) -> anyhow::Result<Level> {
        let output = self.pin(pin)?;

        Ok(if output.is_set_high() {
            Level::High
        } else {
            Level::Low
        })
    }
}
