use serde::Serialize;

use crate::{RelayChannel, RelayState};

#[derive(Debug, Clone)]
pub enum RelayRequest {
    /// Flip one channel on or off.
    Toggle { channel: String },

    /// List every channel with its cached state.
    Status,
}

#[derive(Debug, Clone, Serialize)]
pub enum RelayResponse {
    State(RelayState),
    Channels(Vec<RelayChannel>),
}
