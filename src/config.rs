use std::path::Path;

use bc_camera::CameraConfig;
use bc_relay::RelayConfig;
use bc_sensor::SensorConfig;
use config::{Config, ConfigError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BenchComputerConfig {
    pub relay: RelayConfig,
    pub sensor: SensorConfig,
    pub camera: CameraConfig,
}

impl BenchComputerConfig {
    pub fn read_from_path(path: &Path) -> Result<Self, ConfigError> {
        let mut c = Config::new();

        c.merge(config::File::from(path))?;
        c.merge(config::Environment::with_prefix("BENCH_COMPUTER").separator("__"))?;

        c.try_into()
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, time::Duration};

    use bc_camera::CameraKind;
    use bc_relay::GpioKind;
    use bc_sensor::interface::SensorKind;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let file = write_config(
            r#"
            [relay]
            kind = { type = "Software" }

            [sensor]
            kind = { type = "Software" }

            [camera]
            kind = { type = "Software" }
            "#,
        );

        let config = BenchComputerConfig::read_from_path(file.path()).unwrap();

        assert!(matches!(config.relay.kind, GpioKind::Software));
        assert_eq!(config.relay.channels.len(), 6);
        assert_eq!(config.relay.channels[0].pin, 4);
        assert!(matches!(config.sensor.kind, SensorKind::Software));
        assert_eq!(config.sensor.period, Duration::from_millis(10_000));
        assert!(matches!(config.camera.kind, CameraKind::Software));
        assert_eq!(config.camera.interval_seconds, 5);
        assert_eq!(config.camera.rotation, 90);
    }

    #[test]
    fn hardware_sections_take_pins_and_pipelines() {
        let file = write_config(
            r#"
            [relay]
            kind = { type = "Hardware" }

            [[relay.channels]]
            name = "lights"
            label = "Light"
            pin = 5

            [sensor]
            period = 2500
            kind = { type = "Hardware", dht_pin = 7 }

            [camera]
            photo_dir = "/srv/photos"
            interval_seconds = 30
            kind = { type = "Hardware", still_pipeline = "fakesrc ! filesink location={path}" }
            "#,
        );

        let config = BenchComputerConfig::read_from_path(file.path()).unwrap();

        assert_eq!(config.relay.channels.len(), 1);
        assert_eq!(config.relay.channels[0].pin, 5);
        assert_eq!(config.sensor.period, Duration::from_millis(2500));
        assert!(matches!(
            config.sensor.kind,
            SensorKind::Hardware { dht_pin: 7, .. }
        ));
        assert_eq!(config.camera.interval_seconds, 30);
        match config.camera.kind {
            CameraKind::Hardware {
                still_pipeline,
                video_pipeline,
            } => {
                assert!(still_pipeline.starts_with("fakesrc"));
                assert!(video_pipeline.contains("{path}"));
            }
            CameraKind::Software => panic!("expected hardware camera"),
        }
    }

    #[test]
    fn missing_section_is_an_error() {
        let file = write_config(
            r#"
            [relay]
            kind = { type = "Software" }
            "#,
        );

        assert!(BenchComputerConfig::read_from_path(file.path()).is_err());
    }

    #[test]
    fn shipped_configs_parse() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");

        let bench = BenchComputerConfig::read_from_path(&dir.join("bench-computer.toml")).unwrap();
        assert!(matches!(bench.relay.kind, GpioKind::Hardware));
        assert_eq!(bench.relay.channels[2].label, "Soldering iron");
        assert!(matches!(
            bench.sensor.kind,
            SensorKind::Hardware { dht_pin: 3, .. }
        ));

        let simulated = BenchComputerConfig::read_from_path(&dir.join("simulated.toml")).unwrap();
        assert!(matches!(simulated.camera.kind, CameraKind::Software));
        assert_eq!(simulated.sensor.period, Duration::from_millis(5000));
    }
}
