use serde::{Deserialize, Serialize};

// real gpio header
#[cfg(feature = "rpi")]
pub mod hardware;

// simulated pins
pub mod software;

#[cfg(feature = "rpi")]
pub use hardware::*;
pub use software::*;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize)]
pub enum Level {
    Low,
    High,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum GpioKind {
    Hardware,
    Software,
}

pub trait GpioInterface: Send {
    fn set_output(&mut self, pin: u8) -> anyhow::Result<()>;

    fn write(&mut self, pin: u8, level: Level) -> anyhow::Result<()>;

    fn read(&mut self, pin: u8) -> anyhow::Result<Level>;
}

pub fn connect(kind: GpioKind) -> anyhow::Result<Box<dyn GpioInterface>> {
    match kind {
        GpioKind::Hardware => connect_hardware(),
        GpioKind::Software => Ok(Box::new(SoftwareGpioInterface::new())),
    }
}

#[cfg(feature = "rpi")]
fn connect_hardware() -> anyhow::Result<Box<dyn GpioInterface>> {
    Ok(Box::new(HardwareGpioInterface::new()?))
}

#[cfg(not(feature = "rpi"))]
fn connect_hardware() -> anyhow::Result<Box<dyn GpioInterface>> {
    anyhow::bail!("hardware gpio is unavailable because this executable was not compiled with the `rpi` feature")
}
