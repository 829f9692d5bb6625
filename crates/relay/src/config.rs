use serde::Deserialize;

use crate::GpioKind;

#[derive(Debug, Deserialize)]
pub struct RelayConfig {
    pub kind: GpioKind,

    /// The relay channels wired to the header, in display order.
    #[serde(default = "default_channels")]
    pub channels: Vec<RelayChannelConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RelayChannelConfig {
    /// Short name used to address the channel, e.g. `lights`.
    pub name: String,

    /// Name used in log lines, e.g. `Light`.
    pub label: String,

    /// BCM number of the GPIO pin driving the relay.
    pub pin: u8,
}

impl RelayChannelConfig {
    pub fn new(name: &str, label: &str, pin: u8) -> Self {
        Self {
            name: name.to_owned(),
            label: label.to_owned(),
            pin,
        }
    }
}

pub fn default_channels() -> Vec<RelayChannelConfig> {
    vec![
        // relay hat
        RelayChannelConfig::new("lights", "Light", 4),
        RelayChannelConfig::new("fan", "Fan", 22),
        // external relays
        RelayChannelConfig::new("solder-iron", "Soldering iron", 6),
        RelayChannelConfig::new("hot-air", "Hot air gun", 26),
        RelayChannelConfig::new("plug-1", "External Plug1", 17),
        RelayChannelConfig::new("plug-2", "External Plug2", 27),
    ]
}
