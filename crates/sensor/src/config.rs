use std::time::Duration;

use serde::Deserialize;

use crate::interface::SensorKind;

#[derive(Debug, Deserialize)]
pub struct SensorConfig {
    pub kind: SensorKind,

    /// Time between the start of two read cycles, in milliseconds.
    #[serde(default = "default_period", with = "serde_millis")]
    pub period: Duration,

    /// Time to wait after triggering the sensor before reading it, in
    /// milliseconds.
    #[serde(default = "default_settle", with = "serde_millis")]
    pub settle: Duration,

    /// ADC channel the light-dependent resistor is wired to.
    #[serde(default)]
    pub light_channel: u8,
}

fn default_period() -> Duration {
    Duration::from_millis(10_000)
}

fn default_settle() -> Duration {
    Duration::from_millis(200)
}

impl SensorConfig {
    pub fn with_kind(kind: SensorKind) -> Self {
        Self {
            kind,
            period: default_period(),
            settle: default_settle(),
            light_channel: 0,
        }
    }
}
