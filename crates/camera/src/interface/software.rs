use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::{bail, Context};
use image::{imageops, ImageFormat, Rgb, RgbImage};
use log::trace;

use super::CameraInterface;

const CARD_WIDTH: u32 = 640;
const CARD_HEIGHT: u32 = 384;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CameraCall {
    SetRotation(u16),
    CaptureStill(PathBuf),
    StartRecording(PathBuf),
    StopRecording,
    Close,
}

/// Simulated camera. Stills are a generated test card written as JPEG, and
/// recordings are empty files. Clones share state, so tests can inspect the
/// calls a session made and inject capture failures.
#[derive(Clone, Debug, Default)]
pub struct SoftwareCameraInterface {
    state: Arc<Mutex<SoftwareCameraState>>,
}

#[derive(Debug, Default)]
struct SoftwareCameraState {
    rotation: u16,
    recording: Option<PathBuf>,
    calls: Vec<CameraCall>,
    failures: usize,
}

impl SoftwareCameraInterface {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SoftwareCameraState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<CameraCall> {
        self.state().calls.clone()
    }

    pub fn is_recording(&self) -> bool {
        self.state().recording.is_some()
    }

    /// Makes the next still capture fail without writing anything.
    pub fn fail_next_capture(&self) {
        self.state().failures += 1;
    }
}

fn test_card(rotation: u16) -> RgbImage {
    let card = RgbImage::from_fn(CARD_WIDTH, CARD_HEIGHT, |x, y| {
        let band = (x * 8 / CARD_WIDTH) as u8;
        let shade = 255 - (y * 128 / CARD_HEIGHT) as u8;
        Rgb([
            if band & 1 != 0 { shade } else { 0 },
            if band & 2 != 0 { shade } else { 0 },
            if band & 4 != 0 { shade } else { 0 },
        ])
    });

    match rotation {
        90 => imageops::rotate90(&card),
        180 => imageops::rotate180(&card),
        270 => imageops::rotate270(&card),
        _ => card,
    }
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            bail!("directory {parent:?} does not exist")
        }
        _ => Ok(()),
    }
}

impl CameraInterface for SoftwareCameraInterface {
    fn set_rotation(&mut self, degrees: u16) -> anyhow::Result<()> {
        let mut state = self.state();
        state.calls.push(CameraCall::SetRotation(degrees));

        if degrees % 90 != 0 {
            bail!("unsupported rotation {degrees}°");
        }

        state.rotation = degrees % 360;
        Ok(())
    }

    fn capture_still(&mut self, path: &Path) -> anyhow::Result<()> {
        let mut state = self.state();
        state.calls.push(CameraCall::CaptureStill(path.to_owned()));

        if state.failures > 0 {
            state.failures -= 1;
            bail!("simulated capture failure");
        }

        ensure_parent(path)?;

        test_card(state.rotation)
            .save_with_format(path, ImageFormat::Jpeg)
            .with_context(|| format!("failed to write {path:?}"))?;

        trace!("wrote test card to {path:?}");

        Ok(())
    }

    fn start_recording(&mut self, path: &Path) -> anyhow::Result<()> {
        let mut state = self.state();
        state.calls.push(CameraCall::StartRecording(path.to_owned()));

        if state.recording.is_some() {
            bail!("camera is already recording");
        }

        ensure_parent(path)?;
        fs::File::create(path).with_context(|| format!("failed to create {path:?}"))?;

        state.recording = Some(path.to_owned());
        Ok(())
    }

    fn stop_recording(&mut self) -> anyhow::Result<()> {
        let mut state = self.state();
        state.calls.push(CameraCall::StopRecording);

        state.recording.take().context("camera is not recording")?;
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        let mut state = self.state();
        state.calls.push(CameraCall::Close);
        state.recording = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn still_is_rotated_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.jpg");
        let mut camera = SoftwareCameraInterface::new();

        camera.set_rotation(90).unwrap();
        camera.capture_still(&path).unwrap();

        let written = image::open(&path).unwrap();
        assert_eq!(written.width(), CARD_HEIGHT);
        assert_eq!(written.height(), CARD_WIDTH);
    }

    #[test]
    fn capture_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("1.jpg");
        let mut camera = SoftwareCameraInterface::new();

        assert!(camera.capture_still(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn recording_cannot_be_stopped_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.h264");
        let mut camera = SoftwareCameraInterface::new();

        camera.start_recording(&path).unwrap();
        assert!(path.exists());
        assert!(camera.is_recording());

        camera.stop_recording().unwrap();
        assert!(camera.stop_recording().is_err());
    }
}
