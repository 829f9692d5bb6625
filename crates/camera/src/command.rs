use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone)]
pub enum CameraRequest {
    TakeStill,
    ToggleVideo,

    /// Starts an interval session, or stops the running one.
    ToggleInterval,

    IncreaseInterval,
    DecreaseInterval,
    Status,
}

#[derive(Debug, Clone, Serialize)]
pub enum CameraResponse {
    Unit,
    Path(PathBuf),
    Interval(u32),
    Status(CameraStatus),
}

#[derive(Debug, Clone, Serialize)]
pub struct CameraStatus {
    pub status: String,
    pub interval_label: String,
    pub interval_seconds: u32,
    pub shot_counter: u32,
    pub output_directory: Option<PathBuf>,
    pub preview: Option<PathBuf>,
}
