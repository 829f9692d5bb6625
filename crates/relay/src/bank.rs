use std::{collections::HashSet, fmt};

use anyhow::Context;
use bc_client::Journal;
use log::{debug, warn};
use serde::Serialize;

use crate::{GpioInterface, Level, RelayChannelConfig};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize)]
pub enum RelayState {
    On,
    Off,
}

impl RelayState {
    pub fn toggled(self) -> Self {
        match self {
            RelayState::On => RelayState::Off,
            RelayState::Off => RelayState::On,
        }
    }

    pub fn level(self) -> Level {
        match self {
            RelayState::On => Level::High,
            RelayState::Off => Level::Low,
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayState::On => f.write_str("ON"),
            RelayState::Off => f.write_str("OFF"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("unknown relay channel '{0}'")]
    UnknownChannel(String),

    #[error("relay channel '{0}' is configured more than once")]
    DuplicateName(String),

    #[error("gpio pin {0} is assigned to more than one relay channel")]
    DuplicatePin(u8),
}

#[derive(Clone, Debug, Serialize)]
pub struct RelayChannel {
    pub name: String,
    pub label: String,
    pub pin: u8,

    /// The last level successfully written to the pin. The pin is never read
    /// back to refresh this.
    pub state: RelayState,
}

/// Owns the relay channels and the GPIO interface that drives them.
pub struct RelayBank {
    iface: Box<dyn GpioInterface>,
    channels: Vec<RelayChannel>,
    journal: Journal,
}

impl RelayBank {
    /// Configures every channel's pin as an output and drives it low.
    pub fn new(
        mut iface: Box<dyn GpioInterface>,
        configs: &[RelayChannelConfig],
        journal: Journal,
    ) -> anyhow::Result<Self> {
        let mut names = HashSet::new();
        let mut pins = HashSet::new();

        for config in configs {
            if !names.insert(config.name.as_str()) {
                return Err(RelayError::DuplicateName(config.name.clone()).into());
            }
            if !pins.insert(config.pin) {
                return Err(RelayError::DuplicatePin(config.pin).into());
            }
        }

        let mut channels = Vec::with_capacity(configs.len());

        for config in configs {
            iface
                .set_output(config.pin)
                .with_context(|| format!("failed to configure pin for {}", config.name))?;
            iface
                .write(config.pin, Level::Low)
                .with_context(|| format!("failed to drive {} low", config.name))?;

            debug!("relay {} ready on gpio pin {}", config.name, config.pin);

            channels.push(RelayChannel {
                name: config.name.clone(),
                label: config.label.clone(),
                pin: config.pin,
                state: RelayState::Off,
            });
        }

        Ok(Self {
            iface,
            channels,
            journal,
        })
    }

    /// Flips one channel. The cached state only changes once the write has
    /// gone through; a failed write leaves everything as it was.
    pub fn toggle(&mut self, name: &str) -> anyhow::Result<RelayState> {
        let channel = self
            .channels
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| RelayError::UnknownChannel(name.to_owned()))?;

        let next = channel.state.toggled();

        self.iface
            .write(channel.pin, next.level())
            .with_context(|| format!("failed to switch {} {}", channel.label, next))?;

        channel.state = next;

        self.journal.record(format!("{} is {}", channel.label, next));

        Ok(next)
    }

    pub fn state(&self, name: &str) -> Option<RelayState> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.state)
    }

    pub fn channels(&self) -> &[RelayChannel] {
        &self.channels
    }

    /// Switches every channel off. Used on shutdown, before the GPIO
    /// interface is dropped.
    pub fn release(&mut self) -> anyhow::Result<()> {
        let mut result = Ok(());

        for channel in &mut self.channels {
            match self.iface.write(channel.pin, Level::Low) {
                Ok(()) => channel.state = RelayState::Off,
                Err(err) => {
                    warn!("failed to switch off {}: {err:?}", channel.label);
                    result = Err(err)
                        .with_context(|| format!("failed to release {}", channel.name));
                }
            }
        }

        result
    }
}
