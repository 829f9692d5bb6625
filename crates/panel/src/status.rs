use bc_camera::CameraStatus;
use bc_relay::{RelayChannel, RelayState};
use bc_sensor::SensorReading;
use colored::Colorize;
use prettytable::{row, Table};
use serde::Serialize;

/// Everything the operator sees at a glance.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub relays: Vec<RelayChannel>,
    pub camera: CameraStatus,
    pub reading: Option<SensorReading>,
}

impl StatusSnapshot {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render(&self) -> String {
        let mut relays = Table::new();
        relays.set_titles(row!["relay", "pin", "state"]);

        for channel in &self.relays {
            let state = match channel.state {
                RelayState::On => channel.state.to_string().green().bold(),
                RelayState::Off => channel.state.to_string().normal(),
            };

            relays.add_row(row![channel.label, channel.pin, state]);
        }

        let mut camera = Table::new();
        camera.add_row(row!["camera", self.camera.status]);
        camera.add_row(row!["interval", self.camera.interval_label]);
        camera.add_row(row!["shots", self.camera.shot_counter]);

        if let Some(dir) = &self.camera.output_directory {
            camera.add_row(row!["directory", dir.display()]);
        }

        if let Some(preview) = &self.camera.preview {
            camera.add_row(row!["preview", preview.display()]);
        }

        camera.add_row(row!["sensor", reading_label(self.reading.as_ref())]);

        format!("{relays}{camera}")
    }
}

pub fn reading_label(reading: Option<&SensorReading>) -> String {
    match reading {
        Some(r) => format!(
            "Temperature: {:.2} °C, Humidity: {:.2} %, Light: {:.2} % at {}",
            r.temperature_c,
            r.humidity_pct,
            r.light_pct,
            r.timestamp.format("%Y-%m-%d %H:%M")
        ),
        None => "no reading yet".dimmed().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};

    use super::*;

    fn snapshot() -> StatusSnapshot {
        StatusSnapshot {
            relays: vec![RelayChannel {
                name: "lights".into(),
                label: "Light".into(),
                pin: 4,
                state: RelayState::On,
            }],
            camera: CameraStatus {
                status: "NOT RECORDING".into(),
                interval_label: "Interval: 5s".into(),
                interval_seconds: 5,
                shot_counter: 0,
                output_directory: None,
                preview: None,
            },
            reading: Some(SensorReading {
                temperature_c: 22.5,
                humidity_pct: 40.0,
                light_pct: 75.0,
                timestamp: Local::now(),
            }),
        }
    }

    #[test]
    fn table_lists_relays_and_camera() {
        let text = snapshot().render();

        assert!(text.contains("Light"));
        assert!(text.contains("NOT RECORDING"));
        assert!(text.contains("Interval: 5s"));
        assert!(text.contains("Temperature: 22.50 °C"));
    }

    #[test]
    fn json_snapshot_has_every_section() {
        let value: serde_json::Value =
            serde_json::from_str(&snapshot().to_json().unwrap()).unwrap();

        assert_eq!(value["relays"][0]["name"], "lights");
        assert_eq!(value["relays"][0]["state"], "On");
        assert_eq!(value["camera"]["interval_seconds"], 5);
        assert_eq!(value["reading"]["light_pct"], 75.0);
    }

    #[test]
    fn reading_label_shows_when_it_was_taken() {
        let reading = SensorReading {
            temperature_c: 19.25,
            humidity_pct: 51.0,
            light_pct: 12.5,
            timestamp: Local.with_ymd_and_hms(2024, 3, 4, 17, 9, 42).unwrap(),
        };

        assert_eq!(
            reading_label(Some(&reading)),
            "Temperature: 19.25 °C, Humidity: 51.00 %, Light: 12.50 % at 2024-03-04 17:09"
        );
    }
}
