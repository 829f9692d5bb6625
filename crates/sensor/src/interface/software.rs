use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::bail;

use super::{AnalogInput, EnvironmentSensor};

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated DHT22. Clones share state so a handle can change the climate or
/// inject failed reads while the poller owns the sensor.
#[derive(Clone, Debug)]
pub struct SoftwareEnvironmentSensor {
    state: Arc<Mutex<SoftwareClimate>>,
}

#[derive(Debug)]
struct SoftwareClimate {
    temperature: f64,
    humidity: f64,
    valid: bool,
    failures: usize,
    triggers: usize,
}

impl SoftwareEnvironmentSensor {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SoftwareClimate {
                temperature: 21.5,
                humidity: 45.0,
                valid: false,
                failures: 0,
                triggers: 0,
            })),
        }
    }

    pub fn set(&self, temperature: f64, humidity: f64) {
        let mut state = lock(&self.state);
        state.temperature = temperature;
        state.humidity = humidity;
    }

    /// Makes the next trigger fail the way a bad checksum would.
    pub fn fail_next_read(&self) {
        lock(&self.state).failures += 1;
    }

    pub fn triggers(&self) -> usize {
        lock(&self.state).triggers
    }
}

impl Default for SoftwareEnvironmentSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentSensor for SoftwareEnvironmentSensor {
    fn trigger(&mut self) -> anyhow::Result<()> {
        let mut state = lock(&self.state);
        state.triggers += 1;

        if state.failures > 0 {
            state.failures -= 1;
            state.valid = false;
            bail!("simulated dht22 checksum mismatch");
        }

        state.valid = true;
        Ok(())
    }

    fn temperature(&mut self) -> anyhow::Result<f64> {
        let state = lock(&self.state);
        if !state.valid {
            bail!("sensor has no valid reading");
        }
        Ok(state.temperature)
    }

    fn humidity(&mut self) -> anyhow::Result<f64> {
        let state = lock(&self.state);
        if !state.valid {
            bail!("sensor has no valid reading");
        }
        Ok(state.humidity)
    }
}

/// Simulated ADC. Unset channels read half scale.
#[derive(Clone, Debug, Default)]
pub struct SoftwareAnalogInput {
    channels: Arc<Mutex<HashMap<u8, f64>>>,
}

impl SoftwareAnalogInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, channel: u8, fraction: f64) {
        lock(&self.channels).insert(channel, fraction.clamp(0.0, 1.0));
    }
}

impl AnalogInput for SoftwareAnalogInput {
    fn read_channel(&mut self, channel: u8) -> anyhow::Result<f64> {
        if channel >= 8 {
            bail!("adc has no channel {channel}");
        }

        Ok(lock(&self.channels).get(&channel).copied().unwrap_or(0.5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_need_a_trigger_first() {
        let mut sensor = SoftwareEnvironmentSensor::new();
        assert!(sensor.temperature().is_err());

        sensor.trigger().unwrap();
        assert_eq!(sensor.temperature().unwrap(), 21.5);
        assert_eq!(sensor.humidity().unwrap(), 45.0);
    }

    #[test]
    fn failed_trigger_invalidates_previous_values() {
        let mut sensor = SoftwareEnvironmentSensor::new();
        sensor.trigger().unwrap();

        sensor.fail_next_read();
        assert!(sensor.trigger().is_err());
        assert!(sensor.humidity().is_err());
        assert_eq!(sensor.triggers(), 2);
    }

    #[test]
    fn adc_rejects_missing_channel() {
        let mut adc = SoftwareAnalogInput::new();
        adc.set(0, 0.2);

        assert_eq!(adc.read_channel(0).unwrap(), 0.2);
        assert_eq!(adc.read_channel(3).unwrap(), 0.5);
        assert!(adc.read_channel(8).is_err());
    }
}
