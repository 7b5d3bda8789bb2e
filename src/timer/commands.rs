use std::str::FromStr;

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

/// A user command forwarded to the timer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    Start,
    Pause,
    Toggle,
    Lap,
    Reset,
    ClearLaps,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Command::Start),
            "pause" => Ok(Command::Pause),
            "toggle" => Ok(Command::Toggle),
            "lap" => Ok(Command::Lap),
            "reset" => Ok(Command::Reset),
            "clearlaps" | "clear-laps" | "clear_laps" => Ok(Command::ClearLaps),
            other => Err(anyhow!("unknown command: {other:?}")),
        }
    }
}

/// Maps a keyboard `code` to a command given whether the timer is running.
///
/// Space toggles, `L` laps only while running, `R` resets.
pub fn key_command(code: &str, running: bool) -> Option<Command> {
    match code {
        "Space" if running => Some(Command::Pause),
        "Space" => Some(Command::Start),
        "KeyL" if running => Some(Command::Lap),
        "KeyR" => Some(Command::Reset),
        _ => None,
    }
}
