use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::{bail, Context};
use log::trace;

use super::{GpioInterface, Level};

/// Simulated GPIO header. Clones share the same pins, so a handle kept outside
/// of the relay bank can inspect every write and inject failures.
#[derive(Clone, Debug, Default)]
pub struct SoftwareGpioInterface {
    state: Arc<Mutex<SoftwareGpioState>>,
}

#[derive(Debug, Default)]
struct SoftwareGpioState {
    /// Current level of every pin configured as an output.
    levels: HashMap<u8, Level>,
    /// Every successful write, oldest first.
    writes: Vec<(u8, Level)>,
    /// Number of upcoming writes that will fail.
    failures: usize,
}

impl SoftwareGpioInterface {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SoftwareGpioState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn writes(&self) -> Vec<(u8, Level)> {
        self.state().writes.clone()
    }

    pub fn level(&self, pin: u8) -> Option<Level> {
        self.state().levels.get(&pin).copied()
    }

    /// Makes the next write fail as if the pin driver had errored.
    pub fn fail_next_write(&self) {
        self.state().failures += 1;
    }
}

impl GpioInterface for SoftwareGpioInterface {
    fn set_output(&mut self, pin: u8) -> anyhow::Result<()> {
        self.state().levels.insert(pin, Level::Low);
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> anyhow::Result<()> {
        let mut state = self.state();

        if state.failures > 0 {
            state.failures -= 1;
            bail!("simulated write failure on gpio pin {pin}");
        }

        let current = state
            .levels
            .get_mut(&pin)
            .with_context(|| format!("gpio pin {pin} is not configured as an output"))?;
        *current = level;
        state.writes.push((pin, level));

        trace!("gpio pin {pin} set {level:?}");

        Ok(())
    }

    fn read(&mut self, pin: u8) -> anyhow::Result<Level> {
        self.state()
            .levels
            .get(&pin)
            .copied()
            .with_context(|| format!("gpio pin {pin} is not configured as an output"))
    }
}
