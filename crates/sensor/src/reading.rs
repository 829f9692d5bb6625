use chrono::{DateTime, Local};
use serde::Serialize;

/// One complete sample of the bench environment. A new reading replaces the
/// previous one; nothing older than the latest is kept.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SensorReading {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub light_pct: f64,

    #[serde(serialize_with = "bc_serde_util::serialize_time")]
    pub timestamp: DateTime<Local>,
}

/// Converts the raw fraction read from the light-dependent resistor into a
/// 0-100 light level. The divider reads high in the dark, hence the inversion.
pub fn light_level(fraction: f64) -> f64 {
    let level = 100.0 - fraction * 100.0;
    (level * 100.0).round() / 100.0
}
