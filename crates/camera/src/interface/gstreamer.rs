use std::{collections::HashMap, path::Path};

use anyhow::{bail, Context};
use gst::prelude::*;
use log::*;

use super::CameraInterface;

/// How long a pipeline gets to deliver its end-of-stream before it is torn
/// down anyway.
const PIPELINE_TIMEOUT_SECS: u64 = 10;

pub struct GstCameraInterface {
    still_pipeline: String,
    video_pipeline: String,
    rotation: u16,
    recording: Option<gst::Element>,
}

impl GstCameraInterface {
    pub fn new(still_pipeline: String, video_pipeline: String) -> anyhow::Result<Self> {
        gst::init().context("failed to init gstreamer")?;

        Ok(Self {
            still_pipeline,
            video_pipeline,
            rotation: 0,
            recording: None,
        })
    }

    fn flip_method(&self) -> anyhow::Result<&'static str> {
        Ok(match self.rotation {
            0 => "none",
            90 => "clockwise",
            180 => "rotate-180",
            270 => "counterclockwise",
            other => bail!("unsupported rotation {other}°"),
        })
    }

    fn launch(&self, template: &str, path: &Path) -> anyhow::Result<gst::Element> {
        let mut vars = HashMap::new();
        vars.insert("path".to_owned(), format!("{:?}", path));
        vars.insert("flip".to_owned(), self.flip_method()?.to_owned());

        let desc = strfmt::strfmt(template, &vars).context("invalid pipeline format string")?;

        info!("running gstreamer pipeline: {desc}");

        gst::parse_launch(&desc).context("failed to create gstreamer pipeline")
    }

    /// Blocks until the pipeline reports end-of-stream or an error.
    fn wait_for_eos(pipeline: &gst::Element) -> anyhow::Result<()> {
        let bus = pipeline.bus().context("failed to get pipeline bus")?;

        let msg = bus
            .timed_pop_filtered(
                gst::ClockTime::from_seconds(PIPELINE_TIMEOUT_SECS),
                &[gst::MessageType::Eos, gst::MessageType::Error],
            )
            .context("timed out waiting for gstreamer pipeline")?;

        match msg.view() {
            gst::MessageView::Error(err) => bail!(
                "gstreamer pipeline failed: {} ({:?})",
                err.error(),
                err.debug()
            ),
            _ => Ok(()),
        }
    }
}

impl CameraInterface for GstCameraInterface {
    fn set_rotation(&mut self, degrees: u16) -> anyhow::Result<()> {
        self.rotation = degrees % 360;
        self.flip_method()?;
        Ok(())
    }

    fn capture_still(&mut self, path: &Path) -> anyhow::Result<()> {
        let pipeline = self.launch(&self.still_pipeline, path)?;

        pipeline
            .set_state(gst::State::Playing)
            .context("failed to set the pipeline to the `Playing` state")?;

        let result = Self::wait_for_eos(&pipeline);

        pipeline
            .set_state(gst::State::Null)
            .context("failed to set the pipeline to the `Null` state")?;

        result
    }

    fn start_recording(&mut self, path: &Path) -> anyhow::Result<()> {
        if self.recording.is_some() {
            bail!("camera is already recording");
        }

        let pipeline = self.launch(&self.video_pipeline, path)?;

        pipeline
            .set_state(gst::State::Playing)
            .context("failed to set the pipeline to the `Playing` state")?;

        self.recording = Some(pipeline);

        Ok(())
    }

    fn stop_recording(&mut self) -> anyhow::Result<()> {
        let pipeline = self.recording.as_ref().context("camera is not recording")?;

        debug!("sending eos to pipeline");
        pipeline.send_event(gst::event::Eos::new());

        if let Err(err) = Self::wait_for_eos(pipeline) {
            warn!("recording did not finish cleanly: {err:?}");
        }

        debug!("setting pipeline to null state");
        pipeline
            .set_state(gst::State::Null)
            .context("failed to set the pipeline to the `Null` state")?;

        debug!("dropping pipeline");
        self.recording = None;

        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        if self.recording.is_some() {
            self.stop_recording()?;
        }

        Ok(())
    }
}
