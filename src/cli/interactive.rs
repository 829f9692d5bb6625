use std::path::PathBuf;

use anyhow::Context;
use bc_client::LogEntry;
use bc_panel::{ControlPanel, PanelOutcome, PanelRequest};
use futures::{AsyncWrite, AsyncWriteExt, FutureExt};
use rustyline_async::{Readline, SharedWriter};
use tokio::select;
use tokio_util::sync::CancellationToken;

pub async fn run_interactive_cli(
    mut editor: Readline,
    mut stdout: SharedWriter,
    mut panel: ControlPanel,
    script: Option<PathBuf>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    if let Some(path) = script {
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read script {path:?}"))?;

        if run_script(&mut panel, &contents, &mut stdout).await? {
            info!("script requested exit");
            cancellation_token.cancel();
        }
    }

    let mut confirming_quit = false;

    loop {
        select! {
            _ = cancellation_token.cancelled() => {
                break;
            }
            entry = panel.next_entry() => {
                match entry {
                    Some(entry) => print_entry(&mut stdout, &entry).await?,
                    None => break,
                }
            }
            result = editor.readline().fuse() => {
                let line = match result {
                    Ok(line) => line,
                    Err(err) => {
                        error!("interactive error: {:#?}", err);
                        break;
                    }
                };

                if confirming_quit {
                    confirming_quit = false;

                    if quit_confirmed(&line) {
                        info!("exiting");
                        break;
                    }

                    stdout.write_all(b"not quitting\n").await?;
                    continue;
                }

                stdout.write_all(format!("bc> {}\n", line).as_bytes()).await?;

                if line.trim().is_empty() {
                    continue;
                }

                editor.add_history_entry(line.clone());

                let outcome = run_line(&mut panel, &line, &mut stdout).await?;

                if let Some(PanelOutcome::ConfirmQuit) = outcome {
                    stdout.write_all(b"Do you want to quit? [y/N]\n").await?;
                    confirming_quit = true;
                }
            }
        }
    }

    cancellation_token.cancel();

    Ok(())
}

/// Answer to the quit prompt. Anything but `y` keeps the bench running.
fn quit_confirmed(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Runs every command in a script, skipping blank lines and `#` comments.
/// An `exit` line stops the script without asking and returns `true`.
pub async fn run_script<W: AsyncWrite + Unpin>(
    panel: &mut ControlPanel,
    contents: &str,
    out: &mut W,
) -> anyhow::Result<bool> {
    for line in contents.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        out.write_all(format!("bc> {}\n", line).as_bytes()).await?;

        if let Some(PanelOutcome::ConfirmQuit) = run_line(panel, line, out).await? {
            return Ok(true);
        }
    }

    Ok(false)
}

async fn run_line<W: AsyncWrite + Unpin>(
    panel: &mut ControlPanel,
    line: &str,
    out: &mut W,
) -> anyhow::Result<Option<PanelOutcome>> {
    let request = match PanelRequest::parse_line(line) {
        Ok(request) => request,
        Err(err) => {
            out.write_all(err.to_string().as_bytes()).await?;
            return Ok(None);
        }
    };

    trace!("got request: {:?}", request);

    let outcome = panel.execute(request).await;

    if let PanelOutcome::Output(text) = &outcome {
        out.write_all(text.as_bytes()).await?;

        if !text.ends_with('\n') {
            out.write_all(b"\n").await?;
        }
    }

    Ok(Some(outcome))
}

async fn print_entry<W: AsyncWrite + Unpin>(out: &mut W, entry: &LogEntry) -> anyhow::Result<()> {
    let line = format!("{} {}\n", entry.timestamp.format("%H:%M:%S"), entry.message);
    out.write_all(line.as_bytes()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use bc_client::{ChannelCommandSink, CommandSink, Journal, Task};
    use bc_relay::{
        default_channels, GpioKind, RelayConfig, RelayRequest, RelayResponse, RelayState,
    };
    use tokio::sync::watch;

    use super::*;

    async fn panel_with_relays() -> (
        ControlPanel,
        ChannelCommandSink<RelayRequest, RelayResponse>,
        CancellationToken,
    ) {
        let (journal, journal_rx) = Journal::channel();
        let relay = bc_relay::create_task(
            RelayConfig {
                kind: GpioKind::Software,
                channels: default_channels(),
            },
            journal.clone(),
        )
        .unwrap();
        let relay_cmd = relay.cmd();

        // nothing serves the camera, so camera commands fail
        let (camera_cmd, _) = flume::bounded(1);
        let (_, readings) = watch::channel(None);

        let cancel = CancellationToken::new();
        tokio::spawn(Box::new(relay).run(cancel.clone()));

        let panel = ControlPanel::new(
            relay_cmd.clone(),
            camera_cmd,
            readings,
            journal,
            journal_rx,
        );
        (panel, relay_cmd, cancel)
    }

    async fn relay_state(
        cmd: &ChannelCommandSink<RelayRequest, RelayResponse>,
        name: &str,
    ) -> RelayState {
        match cmd.command(RelayRequest::Status).await.unwrap() {
            RelayResponse::Channels(channels) => {
                channels.into_iter().find(|c| c.name == name).unwrap().state
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn script_stops_at_exit() {
        let (mut panel, relay_cmd, cancel) = panel_with_relays().await;
        let mut out = Vec::new();

        let script = "# warm up\nrelay fan\n\nrelay lights\nexit\nrelay plug-1\n";
        let exited = run_script(&mut panel, script, &mut out).await.unwrap();

        assert!(exited);
        assert_eq!(relay_state(&relay_cmd, "fan").await, RelayState::On);
        assert_eq!(relay_state(&relay_cmd, "lights").await, RelayState::On);
        assert_eq!(relay_state(&relay_cmd, "plug-1").await, RelayState::Off);

        let echoed = String::from_utf8(out).unwrap();
        assert!(echoed.contains("bc> relay fan"));
        assert!(!echoed.contains("warm up"));

        cancel.cancel();
    }

    #[tokio::test]
    async fn bad_lines_do_not_stop_script() {
        let (mut panel, relay_cmd, cancel) = panel_with_relays().await;
        let mut out = Vec::new();

        let exited = run_script(&mut panel, "kettle on\nvideo\nrelay fan\n", &mut out)
            .await
            .unwrap();

        assert!(!exited);
        assert_eq!(relay_state(&relay_cmd, "fan").await, RelayState::On);

        let messages: Vec<_> = panel.drain().into_iter().map(|e| e.message).collect();
        assert!(messages.iter().any(|m| m.starts_with("Toggle video failed:")));
        assert!(messages.contains(&"Fan is ON".to_owned()));

        cancel.cancel();
    }

    #[test]
    fn only_y_confirms_quit() {
        assert!(quit_confirmed("y"));
        assert!(quit_confirmed("Y"));
        assert!(quit_confirmed("  y \n"));

        assert!(!quit_confirmed("n"));
        assert!(!quit_confirmed(""));
        assert!(!quit_confirmed("yes"));
        assert!(!quit_confirmed("exit"));
    }

    #[tokio::test]
    async fn declined_quit_keeps_relays_running() {
        let (mut panel, relay_cmd, cancel) = panel_with_relays().await;
        let mut out = Vec::new();

        let outcome = run_line(&mut panel, "exit", &mut out).await.unwrap();
        assert_eq!(outcome, Some(PanelOutcome::ConfirmQuit));
        assert!(!cancel.is_cancelled());

        run_line(&mut panel, "relay hot-air", &mut out).await.unwrap();
        assert_eq!(relay_state(&relay_cmd, "hot-air").await, RelayState::On);

        cancel.cancel();
    }
}
