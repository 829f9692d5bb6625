use serde::Deserialize;

pub mod dht22;
pub mod mcp3008;
pub mod software;

#[cfg(feature = "rpi")]
pub use dht22::Dht22;
#[cfg(feature = "rpi")]
pub use mcp3008::Mcp3008;
pub use software::*;

/// Temperature and humidity sensor that has to be triggered before it can be
/// read. Values are only valid once the settle delay after [`trigger`] has
/// passed.
///
/// [`trigger`]: EnvironmentSensor::trigger
pub trait EnvironmentSensor: Send {
    fn trigger(&mut self) -> anyhow::Result<()>;

    /// Degrees Celsius.
    fn temperature(&mut self) -> anyhow::Result<f64>;

    /// Relative humidity in percent.
    fn humidity(&mut self) -> anyhow::Result<f64>;
}

pub trait AnalogInput: Send {
    /// Samples one channel, returning a fraction of full scale in [0, 1].
    fn read_channel(&mut self, channel: u8) -> anyhow::Result<f64>;
}

/// Pins of the bit-banged SPI bus the MCP3008 sits on.
#[derive(Copy, Clone, Debug, Deserialize)]
pub struct Mcp3008Pins {
    pub clock: u8,
    pub mosi: u8,
    pub miso: u8,
    pub select: u8,
}

impl Default for Mcp3008Pins {
    fn default() -> Self {
        Self {
            clock: 18,
            mosi: 24,
            miso: 23,
            select: 25,
        }
    }
}

fn default_dht_pin() -> u8 {
    3
}

#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum SensorKind {
    Hardware {
        #[serde(default = "default_dht_pin")]
        dht_pin: u8,
        #[serde(default)]
        adc: Mcp3008Pins,
    },
    Software,
}

pub fn connect(
    kind: SensorKind,
) -> anyhow::Result<(Box<dyn EnvironmentSensor>, Box<dyn AnalogInput>)> {
    match kind {
        SensorKind::Hardware { dht_pin, adc } => connect_hardware(dht_pin, adc),
        SensorKind::Software => Ok((
            Box::new(SoftwareEnvironmentSensor::new()),
            Box::new(SoftwareAnalogInput::new()),
        )),
    }
}

#[cfg(feature = "rpi")]
fn connect_hardware(
    dht_pin: u8,
    adc: Mcp3008Pins,
) -> anyhow::Result<(Box<dyn EnvironmentSensor>, Box<dyn AnalogInput>)> {
    use anyhow::Context;

    let gpio = rppal::gpio::Gpio::new().context("failed to access gpio")?;
    let dht = Dht22::new(&gpio, dht_pin).context("failed to set up dht22")?;
    let adc = Mcp3008::new(&gpio, adc).context("failed to set up mcp3008")?;

    Ok((Box::new(dht), Box::new(adc)))
}

#[cfg(not(feature = "rpi"))]
fn connect_hardware(
    _dht_pin: u8,
    _adc: Mcp3008Pins,
) -> anyhow::Result<(Box<dyn EnvironmentSensor>, Box<dyn AnalogInput>)> {
    anyhow::bail!("hardware sensors are unavailable because this executable was not compiled with the `rpi` feature")
}
