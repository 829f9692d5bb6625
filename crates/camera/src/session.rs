use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use bc_client::Journal;
use bc_serde_util::file_stamp;
use chrono::Local;
use humansize::{file_size_opts, FileSize};
use log::{debug, warn};

use crate::{
    CameraConfig, CameraInterface, CameraStatus, Preview, INTERVAL_PREVIEW_SIZE,
    STILL_PREVIEW_SIZE,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CameraMode {
    Idle,
    RecordingVideo { path: PathBuf },
    TakingIntervalStills { directory: PathBuf },
}

impl fmt::Display for CameraMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraMode::Idle => write!(f, "idle"),
            CameraMode::RecordingVideo { .. } => write!(f, "recording video"),
            CameraMode::TakingIntervalStills { .. } => write!(f, "taking interval stills"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("camera is busy {0}")]
    Busy(CameraMode),
    #[error("no interval session is running")]
    NotCapturingInterval,
}

/// Owns the camera and everything that depends on which mode it is in.
pub struct CameraSession {
    iface: Box<dyn CameraInterface>,
    journal: Journal,
    photo_dir: PathBuf,
    video_dir: PathBuf,
    mode: CameraMode,
    interval_seconds: u32,
    shot_counter: u32,
    output_directory: Option<PathBuf>,
    preview: Option<Preview>,
}

impl CameraSession {
    pub fn new(
        mut iface: Box<dyn CameraInterface>,
        config: &CameraConfig,
        journal: Journal,
    ) -> anyhow::Result<Self> {
        iface
            .set_rotation(config.rotation)
            .context("failed to set camera rotation")?;

        Ok(Self {
            iface,
            journal,
            photo_dir: config.photo_dir.clone(),
            video_dir: config.video_dir.clone(),
            mode: CameraMode::Idle,
            interval_seconds: config.interval_seconds.max(1),
            shot_counter: 0,
            output_directory: None,
            preview: None,
        })
    }

    pub fn mode(&self) -> &CameraMode {
        &self.mode
    }

    pub fn interval_seconds(&self) -> u32 {
        self.interval_seconds
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.into())
    }

    pub fn shot_counter(&self) -> u32 {
        self.shot_counter
    }

    pub fn output_directory(&self) -> Option<&Path> {
        self.output_directory.as_deref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn is_taking_interval_stills(&self) -> bool {
        matches!(self.mode, CameraMode::TakingIntervalStills { .. })
    }

    pub fn status_text(&self) -> &'static str {
        match self.mode {
            CameraMode::Idle => "NOT RECORDING",
            CameraMode::RecordingVideo { .. } => "RECORDING...",
            CameraMode::TakingIntervalStills { .. } => "Taking interval still images...",
        }
    }

    pub fn interval_label(&self) -> String {
        format!("Interval: {}s", self.interval_seconds)
    }

    pub fn status(&self) -> CameraStatus {
        CameraStatus {
            status: self.status_text().to_owned(),
            interval_label: self.interval_label(),
            interval_seconds: self.interval_seconds,
            shot_counter: self.shot_counter,
            output_directory: self.output_directory.clone(),
            preview: self.preview.as_ref().map(|p| p.source.clone()),
        }
    }

    pub fn take_still(&mut self) -> anyhow::Result<PathBuf> {
        if let CameraMode::RecordingVideo { .. } = self.mode {
            return Err(SessionError::Busy(self.mode.clone()).into());
        }

        self.journal.record("Capturing image...");

        fs::create_dir_all(&self.photo_dir)
            .with_context(|| format!("failed to create {:?}", self.photo_dir))?;

        let path = free_file_path(&self.photo_dir, &file_stamp(&Local::now()), "jpg");

        self.iface
            .capture_still(&path)
            .context("failed to capture image")?;

        self.update_preview(&path, STILL_PREVIEW_SIZE);
        self.journal.record(format!("Captured image {}", path.display()));

        Ok(path)
    }

    /// Starts a recording when idle and stops it when recording. Returns the
    /// path of the new recording, or `None` when one was stopped.
    pub fn toggle_video(&mut self) -> anyhow::Result<Option<PathBuf>> {
        match &self.mode {
            CameraMode::Idle => {
                fs::create_dir_all(&self.video_dir)
                    .with_context(|| format!("failed to create {:?}", self.video_dir))?;

                let path = free_file_path(&self.video_dir, &file_stamp(&Local::now()), "h264");

                self.iface
                    .start_recording(&path)
                    .context("failed to start recording")?;

                self.journal.record(format!("Video is recording: {}", path.display()));
                self.mode = CameraMode::RecordingVideo { path: path.clone() };

                Ok(Some(path))
            }
            CameraMode::RecordingVideo { path } => {
                let path = path.clone();

                self.iface
                    .stop_recording()
                    .context("failed to stop recording")?;

                log_file_size(&path);
                self.journal.record("Video is stopped");
                self.mode = CameraMode::Idle;

                Ok(None)
            }
            CameraMode::TakingIntervalStills { .. } => {
                Err(SessionError::Busy(self.mode.clone()).into())
            }
        }
    }

    /// Starts an interval session when idle and stops it when one is running.
    /// Returns the session directory when one was started.
    pub fn toggle_interval(&mut self) -> anyhow::Result<Option<PathBuf>> {
        match &self.mode {
            CameraMode::Idle => self.start_interval().map(Some),
            CameraMode::TakingIntervalStills { directory } => {
                self.journal.record(format!(
                    "Stopped interval capture after {} images in {}",
                    self.shot_counter,
                    directory.display()
                ));
                self.mode = CameraMode::Idle;

                Ok(None)
            }
            CameraMode::RecordingVideo { .. } => {
                Err(SessionError::Busy(self.mode.clone()).into())
            }
        }
    }

    fn start_interval(&mut self) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.photo_dir)
            .with_context(|| format!("failed to create {:?}", self.photo_dir))?;

        let name = format!("Interval_{}", file_stamp(&Local::now()));
        let directory = create_fresh_dir(&self.photo_dir, &name)?;

        self.shot_counter = 0;
        self.output_directory = Some(directory.clone());
        self.mode = CameraMode::TakingIntervalStills {
            directory: directory.clone(),
        };

        self.journal.record(format!(
            "Taking an image every {} seconds, storing at location {}",
            self.interval_seconds,
            directory.display()
        ));

        Ok(directory)
    }

    /// Captures the next frame of the running interval session. The counter
    /// only advances when the frame was written.
    pub fn capture_interval_frame(&mut self) -> anyhow::Result<PathBuf> {
        let directory = match &self.mode {
            CameraMode::TakingIntervalStills { directory } => directory,
            _ => return Err(SessionError::NotCapturingInterval.into()),
        };

        let path = directory.join(format!("{}.jpg", self.shot_counter + 1));

        self.iface
            .capture_still(&path)
            .context("failed to capture interval image")?;

        self.shot_counter += 1;
        self.update_preview(&path, INTERVAL_PREVIEW_SIZE);
        self.journal.record(format!("Captured interval image {}", path.display()));

        Ok(path)
    }

    pub fn increase_interval(&mut self) -> u32 {
        self.interval_seconds = self.interval_seconds.saturating_add(1);
        self.journal.record(self.interval_label());
        self.interval_seconds
    }

    pub fn decrease_interval(&mut self) -> u32 {
        self.interval_seconds = self.interval_seconds.saturating_sub(1).max(1);
        self.journal.record(self.interval_label());
        self.interval_seconds
    }

    /// Stops any recording and closes the camera.
    pub fn release(&mut self) -> anyhow::Result<()> {
        if let CameraMode::RecordingVideo { .. } = self.mode {
            if let Err(err) = self.iface.stop_recording() {
                warn!("failed to stop recording: {err:?}");
            }
        }

        self.mode = CameraMode::Idle;
        self.iface.close().context("failed to close camera")
    }

    fn update_preview(&mut self, path: &Path, size: (u32, u32)) {
        log_file_size(path);

        match Preview::load(path, size) {
            Ok(preview) => self.preview = Some(preview),
            Err(err) => warn!("could not update preview: {err:#}"),
        }
    }
}

/// Creates `root/name`, or `root/name_N` with the smallest free N, and fails
/// rather than reuse an existing directory.
fn create_fresh_dir(root: &Path, name: &str) -> anyhow::Result<PathBuf> {
    for n in 0u32.. {
        let candidate = if n == 0 {
            root.join(name)
        } else {
            root.join(format!("{name}_{n}"))
        };

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(err).with_context(|| format!("failed to create {candidate:?}"))
            }
        }
    }

    anyhow::bail!("no free directory name for {name}")
}

/// `dir/stem.extension`, or `dir/stem_N.extension` with the smallest N that
/// is not taken yet.
fn free_file_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{stem}.{extension}"));
    let mut n = 0u32;

    while candidate.exists() {
        n += 1;
        candidate = dir.join(format!("{stem}_{n}.{extension}"));
    }

    candidate
}

fn log_file_size(path: &Path) {
    if let Ok(meta) = fs::metadata(path) {
        if let Ok(size) = meta.len().file_size(file_size_opts::BINARY) {
            debug!("{path:?}: {size}");
        }
    }
}
