use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bc_client::{Journal, Task};
use log::debug;
use tokio::{
    select,
    sync::watch,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{interface, SensorConfig, SensorPoller, SensorReading};

pub struct SensorTask {
    poller: SensorPoller,
    period: Duration,
    journal: Journal,
    reading_tx: watch::Sender<Option<SensorReading>>,
    reading_rx: watch::Receiver<Option<SensorReading>>,
}

pub fn create_task(config: SensorConfig, journal: Journal) -> anyhow::Result<SensorTask> {
    let (env, analog) = interface::connect(config.kind).context("failed to connect to sensors")?;
    let poller = SensorPoller::new(env, analog, config.light_channel, config.settle);

    Ok(create_task_with(poller, config.period, journal))
}

pub fn create_task_with(poller: SensorPoller, period: Duration, journal: Journal) -> SensorTask {
    let (reading_tx, reading_rx) = watch::channel(None);

    SensorTask {
        poller,
        period,
        journal,
        reading_tx,
        reading_rx,
    }
}

impl SensorTask {
    /// The latest reading, `None` until the first cycle succeeds.
    pub fn readings(&self) -> watch::Receiver<Option<SensorReading>> {
        self.reading_rx.clone()
    }
}

#[async_trait]
impl Task for SensorTask {
    fn name(&self) -> &'static str {
        "sensor"
    }

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        let Self {
            mut poller,
            period,
            journal,
            reading_tx,
            ..
        } = *self;

        let loop_fut = async move {
            // first cycle runs one period after startup
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match poller.poll().await {
                    Ok(reading) => {
                        debug!(
                            "{:.2} °C, {:.2} %, light {:.2} %",
                            reading.temperature_c, reading.humidity_pct, reading.light_pct
                        );
                        reading_tx.send_replace(Some(reading));
                    }
                    Err(err) => journal.record(format!("Sensor read failed: {err:#}")),
                }
            }
        };

        select! {
          _ = cancel.cancelled() => {}
          _ = loop_fut => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{SoftwareAnalogInput, SoftwareEnvironmentSensor};

    #[tokio::test(start_paused = true)]
    async fn failed_read_does_not_stop_polling() {
        let env = SoftwareEnvironmentSensor::new();
        let poller = SensorPoller::new(
            Box::new(env.clone()),
            Box::new(SoftwareAnalogInput::new()),
            0,
            Duration::from_millis(200),
        );
        let (journal, log_rx) = Journal::channel();
        let task = create_task_with(poller, Duration::from_millis(10_000), journal);
        let mut readings = task.readings();
        let cancel = CancellationToken::new();

        env.fail_next_read();
        let started = tokio::time::Instant::now();
        let handle = tokio::spawn(Box::new(task).run(cancel.clone()));

        // first cycle at 10 s fails
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(env.triggers(), 1);
        assert!(readings.borrow().is_none());
        let failure = log_rx.try_recv().unwrap();
        assert!(failure.message.starts_with("Sensor read failed"));

        // second cycle at 20 s still runs and publishes
        readings.changed().await.unwrap();
        assert_eq!(env.triggers(), 2);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(20) && elapsed < Duration::from_secs(21));
        assert_eq!(readings.borrow().as_ref().unwrap().temperature_c, 21.5);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }
}
