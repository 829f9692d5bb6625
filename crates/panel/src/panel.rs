use std::fmt::Write;

use anyhow::Context;
use bc_camera::{CameraRequest, CameraResponse};
use bc_client::{ChannelCommandSink, CommandSink, Journal, LogEntry};
use bc_relay::{RelayRequest, RelayResponse};
use bc_sensor::SensorReading;
use colored::Colorize;
use log::warn;
use tokio::sync::watch;

use crate::{EventLog, PanelRequest, StatusSnapshot};

/// What the console should do after a request has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelOutcome {
    Done,
    Output(String),

    /// The operator asked to quit; nothing is released until they confirm.
    ConfirmQuit,
}

/// Binds operator requests to the relay and camera tasks, tracks the latest
/// sensor reading, and is the only writer of the operator log.
pub struct ControlPanel {
    relay_cmd: ChannelCommandSink<RelayRequest, RelayResponse>,
    camera_cmd: ChannelCommandSink<CameraRequest, CameraResponse>,
    readings: watch::Receiver<Option<SensorReading>>,
    journal: Journal,
    journal_rx: flume::Receiver<LogEntry>,
    log: EventLog,
}

impl ControlPanel {
    pub fn new(
        relay_cmd: ChannelCommandSink<RelayRequest, RelayResponse>,
        camera_cmd: ChannelCommandSink<CameraRequest, CameraResponse>,
        readings: watch::Receiver<Option<SensorReading>>,
        journal: Journal,
        journal_rx: flume::Receiver<LogEntry>,
    ) -> Self {
        Self {
            relay_cmd,
            camera_cmd,
            readings,
            journal,
            journal_rx,
            log: EventLog::default(),
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn latest_reading(&self) -> Option<SensorReading> {
        self.readings.borrow().clone()
    }

    /// Waits for the next journal line from any task and appends it to the
    /// log. Returns `None` once every journal handle is gone.
    pub async fn next_entry(&mut self) -> Option<LogEntry> {
        let entry = self.journal_rx.recv_async().await.ok()?;
        self.log.push(entry.clone());
        Some(entry)
    }

    /// Appends every journal line that is already waiting.
    pub fn drain(&mut self) -> Vec<LogEntry> {
        let entries: Vec<_> = self.journal_rx.try_iter().collect();

        for entry in &entries {
            self.log.push(entry.clone());
        }

        entries
    }

    pub async fn execute(&mut self, request: PanelRequest) -> PanelOutcome {
        match request {
            PanelRequest::Relay { name } => {
                let action = format!("Toggle {name}");
                let result = self
                    .relay_cmd
                    .command(RelayRequest::Toggle { channel: name })
                    .await;
                self.report(&action, result.map(|_| ()))
            }
            PanelRequest::Still => self.camera(CameraRequest::TakeStill, "Take still").await,
            PanelRequest::Video => self.camera(CameraRequest::ToggleVideo, "Toggle video").await,
            PanelRequest::Interval => {
                self.camera(CameraRequest::ToggleInterval, "Toggle interval")
                    .await
            }
            PanelRequest::IntervalUp => {
                self.camera(CameraRequest::IncreaseInterval, "Increase interval")
                    .await
            }
            PanelRequest::IntervalDown => {
                self.camera(CameraRequest::DecreaseInterval, "Decrease interval")
                    .await
            }
            PanelRequest::Status { json } => {
                let rendered = self.status().await.and_then(|snapshot| {
                    if json {
                        snapshot.to_json()
                    } else {
                        Ok(snapshot.render())
                    }
                });

                match rendered {
                    Ok(text) => PanelOutcome::Output(text),
                    Err(err) => self.report("Status", Err(err)),
                }
            }
            PanelRequest::Log { count } => {
                self.drain();
                PanelOutcome::Output(self.render_log(count))
            }
            PanelRequest::Exit => PanelOutcome::ConfirmQuit,
        }
    }

    pub async fn status(&self) -> anyhow::Result<StatusSnapshot> {
        let relays = match self.relay_cmd.command(RelayRequest::Status).await? {
            RelayResponse::Channels(channels) => channels,
            other => anyhow::bail!("unexpected relay response {other:?}"),
        };

        let camera = match self.camera_cmd.command(CameraRequest::Status).await? {
            CameraResponse::Status(status) => status,
            other => anyhow::bail!("unexpected camera response {other:?}"),
        };

        Ok(StatusSnapshot {
            relays,
            camera,
            reading: self.latest_reading(),
        })
    }

    async fn camera(&mut self, request: CameraRequest, action: &str) -> PanelOutcome {
        let result = self
            .camera_cmd
            .command(request)
            .await
            .with_context(|| format!("camera rejected {}", action.to_lowercase()));
        self.report(action, result.map(|_| ()))
    }

    fn report(&mut self, action: &str, result: anyhow::Result<()>) -> PanelOutcome {
        if let Err(err) = result {
            warn!("{action} failed: {err:?}");
            self.journal.record(format!("{action} failed: {err:#}"));
        }

        PanelOutcome::Done
    }

    fn render_log(&self, count: usize) -> String {
        let mut out = String::new();

        for entry in self.log.latest(count) {
            let _ = writeln!(
                out,
                "{} {}",
                entry.timestamp.format("%H:%M:%S").to_string().dimmed(),
                entry.message
            );
        }

        out
    }
}
