use std::path::PathBuf;

use serde::Deserialize;

use crate::interface::CameraKind;

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    pub kind: CameraKind,

    /// Root for stills and interval session directories.
    #[serde(default = "default_photo_dir")]
    pub photo_dir: PathBuf,

    #[serde(default = "default_video_dir")]
    pub video_dir: PathBuf,

    /// Seconds between interval frames. Values below 1 are raised to 1.
    #[serde(default = "default_interval")]
    pub interval_seconds: u32,

    /// Rotation applied to every capture, in degrees.
    #[serde(default = "default_rotation")]
    pub rotation: u16,
}

fn default_photo_dir() -> PathBuf {
    PathBuf::from("../photos")
}

fn default_video_dir() -> PathBuf {
    PathBuf::from("../videos")
}

fn default_interval() -> u32 {
    5
}

fn default_rotation() -> u16 {
    90
}

impl CameraConfig {
    pub fn with_kind(kind: CameraKind) -> Self {
        Self {
            kind,
            photo_dir: default_photo_dir(),
            video_dir: default_video_dir(),
            interval_seconds: default_interval(),
            rotation: default_rotation(),
        }
    }
}
