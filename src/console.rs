use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::{
    timer::{
        commands::{key_command, Command},
        TimerController,
    },
    view::DisplayModel,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const HELP: &str = "space/enter: start or pause, l: lap, r: reset, c: clear laps, s: show, q: quit";

enum Input {
    Command(Command),
    Show,
    Quit,
}

/// Maps one console line onto an input. Single letters go through the same
/// key mapping as the widget's keyboard shortcuts; full command names are
/// accepted as well.
fn parse_line(line: &str, running: bool) -> Result<Input> {
    let key = match line.trim() {
        "" | "space" => "Space",
        "l" | "L" => "KeyL",
        "r" | "R" => "KeyR",
        "c" | "C" => return Ok(Input::Command(Command::ClearLaps)),
        "s" | "S" | "show" => return Ok(Input::Show),
        "q" | "Q" | "quit" => return Ok(Input::Quit),
        other => return Ok(Input::Command(other.parse()?)),
    };
    Ok(key_command(key, running).map_or(Input::Show, Input::Command))
}

pub(crate) async fn read_loop(controller: &TimerController) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    render(&mut stdout, HELP).await?;
    render(&mut stdout, &DisplayModel::from_state(&controller.get_state()).to_string()).await?;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                log_error!("stdin read failed: {err}");
                return Err(err).context("failed to read stdin");
            }
        };
        let running = controller.get_state().is_running();
        let snapshot = match parse_line(&line, running) {
            Ok(Input::Command(command)) => controller.dispatch(command),
            Ok(Input::Show) => controller.get_snapshot(),
            Ok(Input::Quit) => break,
            Err(err) => {
                log_warn!("{err}");
                render(&mut stdout, HELP).await?;
                continue;
            }
        };
        render(&mut stdout, &DisplayModel::from_state(&snapshot.state).to_string()).await?;
    }

    log_info!("console closed");
    Ok(())
}

async fn render(stdout: &mut tokio::io::Stdout, text: &str) -> Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
