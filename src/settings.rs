use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;
const DEFAULT_HEARTBEAT_EVERY_TICKS: u32 = 100;
const DEBUG_HEARTBEAT_EVERY_TICKS: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StopwatchSettings {
    /// Period of the tick source, also the amount each tick adds.
    pub tick_interval_ms: u64,
    /// How many ticks pass between heartbeat log lines.
    pub heartbeat_every_ticks: u32,
}

impl Default for StopwatchSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            heartbeat_every_ticks: DEFAULT_HEARTBEAT_EVERY_TICKS,
        }
    }
}

impl StopwatchSettings {
    /// Tick interval, never shorter than 1 ms.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    fn apply_env(mut self) -> Self {
        let debug_mode = std::env::var("STOPWATCH_DEBUG")
            .map(|value| is_truthy(&value))
            .unwrap_or(false);
        if debug_mode {
            self.heartbeat_every_ticks = DEBUG_HEARTBEAT_EVERY_TICKS;
        }
        self
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

pub struct SettingsStore {
    data: StopwatchSettings,
}

impl SettingsStore {
    /// Loads settings from `path`. A missing file or malformed contents
    /// give the defaults; an unreadable file is an error.
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let data = match &path {
            Some(path) if path.exists() => read_settings(path)?,
            Some(path) => {
                log_info!("no settings at {}, using defaults", path.display());
                StopwatchSettings::default()
            }
            None => StopwatchSettings::default(),
        };

        Ok(Self {
            data: data.apply_env(),
        })
    }

    pub fn stopwatch(&self) -> StopwatchSettings {
        self.data.clone()
    }
}

fn read_settings(path: &Path) -> Result<StopwatchSettings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
        log_warn!("ignoring malformed settings in {}: {err}", path.display());
        StopwatchSettings::default()
    }))
}
