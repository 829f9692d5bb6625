pub mod config;
pub mod interface;
mod poller;
mod reading;
mod task;

pub use config::*;
pub use interface::{AnalogInput, EnvironmentSensor};
pub use poller::*;
pub use reading::*;
pub use task::*;
