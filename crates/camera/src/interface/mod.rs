use std::path::Path;

use serde::Deserialize;

#[cfg(feature = "gstreamer")]
pub mod gstreamer;

pub mod software;

#[cfg(feature = "gstreamer")]
pub use self::gstreamer::*;
pub use software::*;

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum CameraKind {
    Hardware {
        /// gstreamer pipeline that captures one frame to `{path}`.
        #[serde(default = "default_still_pipeline")]
        still_pipeline: String,

        /// gstreamer pipeline that records to `{path}` until stopped.
        #[serde(default = "default_video_pipeline")]
        video_pipeline: String,
    },
    Software,
}

pub fn default_still_pipeline() -> String {
    "libcamerasrc num-buffers=1 ! videoconvert ! videoflip method={flip} ! jpegenc ! filesink location={path}".to_owned()
}

pub fn default_video_pipeline() -> String {
    "libcamerasrc ! video/x-raw,width=1280,height=720,framerate=30/1 ! videoconvert ! videoflip method={flip} ! x264enc tune=zerolatency ! video/x-h264,profile=baseline ! filesink location={path}".to_owned()
}

pub trait CameraInterface: Send {
    /// Rotation applied to every frame written from now on, in degrees.
    fn set_rotation(&mut self, degrees: u16) -> anyhow::Result<()>;

    fn capture_still(&mut self, path: &Path) -> anyhow::Result<()>;

    fn start_recording(&mut self, path: &Path) -> anyhow::Result<()>;

    fn stop_recording(&mut self) -> anyhow::Result<()>;

    /// Releases the camera. Nothing may be called afterwards.
    fn close(&mut self) -> anyhow::Result<()>;
}

pub fn connect(kind: CameraKind) -> anyhow::Result<Box<dyn CameraInterface>> {
    match kind {
        CameraKind::Hardware {
            still_pipeline,
            video_pipeline,
        } => connect_hardware(still_pipeline, video_pipeline),
        CameraKind::Software => Ok(Box::new(SoftwareCameraInterface::new())),
    }
}

#[cfg(feature = "gstreamer")]
fn connect_hardware(
    still_pipeline: String,
    video_pipeline: String,
) -> anyhow::Result<Box<dyn CameraInterface>> {
    Ok(Box::new(GstCameraInterface::new(
        still_pipeline,
        video_pipeline,
    )?))
}

#[cfg(not(feature = "gstreamer"))]
fn connect_hardware(
    _still_pipeline: String,
    _video_pipeline: String,
) -> anyhow::Result<Box<dyn CameraInterface>> {
    anyhow::bail!("hardware camera is unavailable because this executable was not compiled with the `gstreamer` feature")
}
