use anyhow::Context;
use bc_client::{Journal, Task};
use bc_panel::ControlPanel;
use clap::Parser;
use rustyline_async::{Readline, SharedWriter};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::metadata::LevelFilter;
use tracing_subscriber::{filter::Targets, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::cli::{args::MainArgs, interactive::run_interactive_cli};

#[macro_use]
extern crate tracing;

mod cli;
mod config;

/// Targets that end up in the rolling log files.
const FILE_LOG_TARGETS: [&str; 7] = [
    "bench_computer",
    "bc_client",
    "bc_relay",
    "bc_sensor",
    "bc_camera",
    "bc_panel",
    "bc_async_util",
];

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // setup colorful backtraces
    color_backtrace::install();

    // set up logging and interactive line editor
    let (editor, stdout) =
        Readline::new("bc> ".into()).context("failed to create interactive editor")?;

    let mut targets = Targets::new();

    if let Ok(directives) = std::env::var("RUST_LOG") {
        for directive in directives.split(',') {
            if let Some((target, level)) = directive.split_once('=') {
                targets = targets.with_target(
                    target,
                    level.parse::<LevelFilter>().context("invalid log level")?,
                );
            } else {
                targets = targets.with_default(
                    directive
                        .parse::<LevelFilter>()
                        .context("invalid log level")?,
                );
            }
        }
    }

    let (writer, _guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::hourly("logs", "bench-computer"));

    let reg = tracing_subscriber::registry();

    #[cfg(tokio_unstable)]
    let reg = reg.with(console_subscriber::spawn());

    reg
        // writer that outputs to console
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer({
                    let stdout = stdout.clone();
                    move || stdout.clone()
                })
                .with_filter(targets),
        )
        // writer that outputs to files
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(
                    Targets::new().with_targets(
                        FILE_LOG_TARGETS
                            .iter()
                            .map(|target| (*target, LevelFilter::DEBUG)),
                    ),
                ),
        )
        .init();

    let main_args = MainArgs::parse();

    debug!("reading config from {:?}", &main_args.config);
    let config = crate::config::BenchComputerConfig::read_from_path(&main_args.config)
        .context("failed to read config file")?;

    run_tasks(config, main_args, editor, stdout).await
}

async fn run_tasks(
    config: crate::config::BenchComputerConfig,
    main_args: MainArgs,
    editor: Readline,
    stdout: SharedWriter,
) -> anyhow::Result<()> {
    let cancellation_token = CancellationToken::new();

    ctrlc::set_handler({
        let cancellation_token = cancellation_token.clone();
        move || {
            info!("received interrupt, shutting down");
            cancellation_token.cancel();
        }
    })
    .context("could not set ctrl+c handler")?;

    let (journal, journal_rx) = Journal::channel();
    let mut tasks = Vec::<Box<dyn Task>>::new();

    debug!("initializing relay task");
    let relay_task = bc_relay::create_task(config.relay, journal.clone())
        .context("failed to initialize relay task")?;
    let relay_cmd_tx = relay_task.cmd();
    tasks.push(Box::new(relay_task));

    debug!("initializing sensor task");
    let sensor_task = bc_sensor::create_task(config.sensor, journal.clone())
        .context("failed to initialize sensor task")?;
    let readings_rx = sensor_task.readings();
    tasks.push(Box::new(sensor_task));

    debug!("initializing camera task");
    let camera_task = bc_camera::create_task(config.camera, journal.clone())
        .context("failed to initialize camera task")?;
    let camera_cmd_tx = camera_task.cmd();
    tasks.push(Box::new(camera_task));

    let panel = ControlPanel::new(relay_cmd_tx, camera_cmd_tx, readings_rx, journal, journal_rx);

    let mut join_set = JoinSet::new();

    join_set.spawn(run_interactive_cli(
        editor,
        stdout,
        panel,
        main_args.script,
        cancellation_token.clone(),
    ));

    for task in tasks {
        debug!("starting {} task", task.name());
        join_set.spawn(task.run(cancellation_token.clone()));
    }

    join_tasks(join_set, cancellation_token).await
}

/// Waits for every task. The first failure cancels the rest and is returned
/// once all of them have finished.
async fn join_tasks(
    mut join_set: JoinSet<anyhow::Result<()>>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    // every task is joined, even after a failure, so relays and camera are released
    let mut failure = None;

    while let Some(res) = join_set.join_next().await {
        // Err is a panic, Ok(Err) is a task that returned an error
        let err = match res {
            Err(err) => anyhow::Error::new(err).context("task failed"),
            Ok(Err(err)) => err.context("task terminated with error"),
            Ok(Ok(())) => {
                info!("exited task");
                continue;
            }
        };

        error!("{:?}", err);
        cancellation_token.cancel();
        failure.get_or_insert(err);
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test]
    async fn failed_task_still_lets_others_release() {
        let cancel = CancellationToken::new();
        let released = Arc::new(AtomicBool::new(false));
        let mut join_set: JoinSet<anyhow::Result<()>> = JoinSet::new();

        join_set.spawn({
            let cancel = cancel.clone();
            let released = released.clone();
            async move {
                cancel.cancelled().await;
                released.store(true, Ordering::SeqCst);
                Ok(())
            }
        });
        join_set.spawn(async { Err(anyhow::anyhow!("gpio went away")) });

        let err = join_tasks(join_set, cancel.clone()).await.unwrap_err();

        assert!(cancel.is_cancelled());
        assert!(released.load(Ordering::SeqCst));
        assert!(format!("{err:#}").contains("gpio went away"));
    }

    #[tokio::test]
    async fn panicked_task_is_reported() {
        let cancel = CancellationToken::new();
        let mut join_set: JoinSet<anyhow::Result<()>> = JoinSet::new();

        join_set.spawn(async { panic!("camera thread died") });

        let err = join_tasks(join_set, cancel.clone()).await.unwrap_err();

        assert!(cancel.is_cancelled());
        assert!(format!("{err:#}").starts_with("task failed"));
    }

    #[tokio::test]
    async fn clean_exit_is_ok() {
        let mut join_set: JoinSet<anyhow::Result<()>> = JoinSet::new();
        join_set.spawn(async { Ok(()) });

        assert!(join_tasks(join_set, CancellationToken::new()).await.is_ok());
    }
}
