use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bc_client::{ChannelCommandSink, ChannelCommandSource, Journal, Task};
use log::{debug, error, trace};
use tokio::{
    select,
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    interface, CameraConfig, CameraInterface, CameraRequest, CameraResponse, CameraSession,
};

pub struct CameraTask {
    session: CameraSession,
    journal: Journal,
    cmd_tx: ChannelCommandSink<CameraRequest, CameraResponse>,
    cmd_rx: ChannelCommandSource<CameraRequest, CameraResponse>,
}

pub fn create_task(config: CameraConfig, journal: Journal) -> anyhow::Result<CameraTask> {
    let iface = interface::connect(config.kind.clone()).context("failed to connect to camera")?;
    create_task_with(iface, &config, journal)
}

pub fn create_task_with(
    iface: Box<dyn CameraInterface>,
    config: &CameraConfig,
    journal: Journal,
) -> anyhow::Result<CameraTask> {
    let session = CameraSession::new(iface, config, journal.clone())?;
    let (cmd_tx, cmd_rx) = flume::bounded(256);

    Ok(CameraTask {
        session,
        journal,
        cmd_tx,
        cmd_rx,
    })
}

impl CameraTask {
    pub fn cmd(&self) -> ChannelCommandSink<CameraRequest, CameraResponse> {
        self.cmd_tx.clone()
    }
}

/// Interval timer for the running session, tagged with the period it was
/// built for.
type Ticker = Option<(u32, Interval)>;

fn sync_ticker(session: &CameraSession, ticker: &mut Ticker) {
    if !session.is_taking_interval_stills() {
        *ticker = None;
        return;
    }

    let seconds = session.interval_seconds();

    if !matches!(*ticker, Some((current, _)) if current == seconds) {
        let period = session.interval();
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!("interval capture every {period:?}");
        *ticker = Some((seconds, interval));
    }
}

async fn next_tick(ticker: &mut Ticker) {
    match ticker {
        Some((_, interval)) => {
            interval.tick().await;
        }
        None => futures::future::pending().await,
    }
}

fn path_or_unit(path: Option<PathBuf>) -> CameraResponse {
    path.map_or(CameraResponse::Unit, CameraResponse::Path)
}

fn exec(session: &mut CameraSession, req: CameraRequest) -> anyhow::Result<CameraResponse> {
    match req {
        CameraRequest::TakeStill => session.take_still().map(CameraResponse::Path),
        CameraRequest::ToggleVideo => session.toggle_video().map(path_or_unit),
        CameraRequest::ToggleInterval => session.toggle_interval().map(path_or_unit),
        CameraRequest::IncreaseInterval => {
            Ok(CameraResponse::Interval(session.increase_interval()))
        }
        CameraRequest::DecreaseInterval => {
            Ok(CameraResponse::Interval(session.decrease_interval()))
        }
        CameraRequest::Status => Ok(CameraResponse::Status(session.status())),
    }
}

#[async_trait]
impl Task for CameraTask {
    fn name(&self) -> &'static str {
        "camera"
    }

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        let Self {
            mut session,
            journal,
            cmd_rx,
            ..
        } = *self;

        let loop_fut = async {
            let mut ticker: Ticker = None;

            loop {
                select! {
                    cmd = cmd_rx.recv_async() => {
                        let (req, ret) = match cmd {
                            Ok(cmd) => cmd,
                            Err(_) => break,
                        };

                        trace!("camera request: {req:?}");

                        let result = bc_async_util::block_in_place(|| exec(&mut session, req));
                        sync_ticker(&session, &mut ticker);

                        let _ = ret.send(result);
                    }
                    _ = next_tick(&mut ticker) => {
                        let result =
                            bc_async_util::block_in_place(|| session.capture_interval_frame());

                        if let Err(err) = result {
                            journal.record(format!("Interval capture failed: {err:#}"));
                        }
                    }
                }
            }

            Ok::<_, anyhow::Error>(())
        };

        select! {
          _ = cancel.cancelled() => {}
          res = loop_fut => { res? }
        }

        debug!("releasing camera");

        if let Err(err) = bc_async_util::block_in_place(|| session.release()) {
            error!("failed to release camera: {err:?}");
        }

        Ok(())
    }
}
