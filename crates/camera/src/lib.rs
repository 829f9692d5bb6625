pub mod command;
pub mod config;
pub mod interface;
mod preview;
mod session;
mod task;

pub use command::*;
pub use config::*;
pub use interface::{CameraInterface, CameraKind};
pub use preview::*;
pub use session::*;
pub use task::*;
