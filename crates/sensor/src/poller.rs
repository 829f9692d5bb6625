use std::time::Duration;

use anyhow::Context;
use bc_async_util::block_in_place;
use chrono::Local;

use crate::{light_level, AnalogInput, EnvironmentSensor, SensorReading};

/// Runs one read cycle across the environment sensor and the light channel.
pub struct SensorPoller {
    env: Box<dyn EnvironmentSensor>,
    analog: Box<dyn AnalogInput>,
    light_channel: u8,
    settle: Duration,
}

impl SensorPoller {
    pub fn new(
        env: Box<dyn EnvironmentSensor>,
        analog: Box<dyn AnalogInput>,
        light_channel: u8,
        settle: Duration,
    ) -> Self {
        Self {
            env,
            analog,
            light_channel,
            settle,
        }
    }

    /// Triggers the sensor, waits out the settle delay without blocking the
    /// runtime, then collects temperature, humidity and light level.
    pub async fn poll(&mut self) -> anyhow::Result<SensorReading> {
        block_in_place(|| self.env.trigger()).context("failed to trigger environment sensor")?;

        tokio::time::sleep(self.settle).await;

        let (temperature_c, humidity_pct) = block_in_place(|| {
            Ok::<_, anyhow::Error>((self.env.temperature()?, self.env.humidity()?))
        })
        .context("failed to read environment sensor")?;

        let light_channel = self.light_channel;
        let fraction = block_in_place(|| self.analog.read_channel(light_channel))
            .context("failed to read light sensor")?;

        Ok(SensorReading {
            temperature_c,
            humidity_pct,
            light_pct: light_level(fraction),
            timestamp: Local::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{SoftwareAnalogInput, SoftwareEnvironmentSensor};

    fn poller() -> (SensorPoller, SoftwareEnvironmentSensor, SoftwareAnalogInput) {
        let env = SoftwareEnvironmentSensor::new();
        let adc = SoftwareAnalogInput::new();
        let poller = SensorPoller::new(
            Box::new(env.clone()),
            Box::new(adc.clone()),
            0,
            Duration::from_millis(200),
        );
        (poller, env, adc)
    }

    #[tokio::test(start_paused = true)]
    async fn reading_combines_climate_and_light() {
        let (mut poller, env, adc) = poller();
        env.set(24.3, 51.2);
        adc.set(0, 0.4);

        let started = tokio::time::Instant::now();
        let reading = poller.poll().await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(reading.temperature_c, 24.3);
        assert_eq!(reading.humidity_pct, 51.2);
        assert_eq!(reading.light_pct, 60.0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_trigger_surfaces_error() {
        let (mut poller, env, _adc) = poller();
        env.fail_next_read();

        let err = poller.poll().await.unwrap_err();
        assert!(format!("{err:#}").contains("checksum"));

        assert!(poller.poll().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_light_channel_fails_cycle() {
        let env = SoftwareEnvironmentSensor::new();
        let mut poller = SensorPoller::new(
            Box::new(env),
            Box::new(SoftwareAnalogInput::new()),
            9,
            Duration::from_millis(200),
        );

        let err = poller.poll().await.unwrap_err();
        assert!(format!("{err:#}").contains("light sensor"));
    }
}
