use anyhow::Context;
use async_trait::async_trait;
use bc_client::{ChannelCommandSink, ChannelCommandSource, Journal, Task};
use log::{debug, error, trace};
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::{interface, GpioInterface, RelayBank, RelayConfig, RelayRequest, RelayResponse};

pub struct RelayTask {
    bank: RelayBank,
    cmd_tx: ChannelCommandSink<RelayRequest, RelayResponse>,
    cmd_rx: ChannelCommandSource<RelayRequest, RelayResponse>,
}

pub fn create_task(config: RelayConfig, journal: Journal) -> anyhow::Result<RelayTask> {
    let iface = interface::connect(config.kind).context("failed to connect to gpio")?;
    create_task_with(iface, config, journal)
}

/// Like [`create_task`], but drives an interface that has already been set up.
pub fn create_task_with(
    iface: Box<dyn GpioInterface>,
    config: RelayConfig,
    journal: Journal,
) -> anyhow::Result<RelayTask> {
    let bank = RelayBank::new(iface, &config.channels, journal)
        .context("failed to initialize relay channels")?;
    let (cmd_tx, cmd_rx) = flume::bounded(256);

    Ok(RelayTask {
        bank,
        cmd_tx,
        cmd_rx,
    })
}

impl RelayTask {
    pub fn cmd(&self) -> ChannelCommandSink<RelayRequest, RelayResponse> {
        self.cmd_tx.clone()
    }
}

#[async_trait]
impl Task for RelayTask {
    fn name(&self) -> &'static str {
        "relay"
    }

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        let Self {
            mut bank, cmd_rx, ..
        } = *self;

        let loop_fut = async {
            while let Ok((req, ret)) = cmd_rx.recv_async().await {
                trace!("relay request: {req:?}");

                let result = bc_async_util::block_in_place(|| match req {
                    RelayRequest::Toggle { channel } => {
                        bank.toggle(&channel).map(RelayResponse::State)
                    }
                    RelayRequest::Status => Ok(RelayResponse::Channels(bank.channels().to_vec())),
                });

                let _ = ret.send(result);
            }

            Ok::<_, anyhow::Error>(())
        };

        select! {
          _ = cancel.cancelled() => {}
          res = loop_fut => { res? }
        }

        debug!("switching off relays");

        if let Err(err) = bc_async_util::block_in_place(|| bank.release()) {
            error!("failed to release relays: {err:?}");
        }

        Ok(())
    }
}
