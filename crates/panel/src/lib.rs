mod command;
mod event_log;
mod panel;
mod status;

pub use command::*;
pub use event_log::*;
pub use panel::*;
pub use status::*;
