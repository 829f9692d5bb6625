mod bank;
pub mod command;
pub mod config;
pub mod interface;
mod task;

pub use bank::*;
pub use command::*;
pub use config::*;
pub use interface::{GpioInterface, GpioKind, Level};
pub use task::*;
