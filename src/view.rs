//! What a presentation layer renders for a given timer state.
//!
//! Everything here is a pure projection of [`TimerState`]; rendering it to a
//! screen is left to the caller.

use std::fmt;

use serde::Serialize;

use crate::timer::{format_time, Lap, TimerState, PLACEHOLDER_TIME};

pub const NO_LAPS_MESSAGE: &str = "No lap times yet";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LapRow {
    pub label: String,
    pub total_text: String,
    pub split_text: String,
}

impl From<&Lap> for LapRow {
    fn from(lap: &Lap) -> Self {
        Self {
            label: format!("Lap {}", lap.number),
            total_text: format_time(lap.total_ms),
            split_text: format!("(+{})", format_time(lap.split_ms)),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub total_laps: String,
    pub best_lap: String,
    pub average_lap: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayModel {
    pub time_text: String,
    pub status: &'static str,
    pub start_label: &'static str,
    pub start_enabled: bool,
    pub pause_enabled: bool,
    pub lap_enabled: bool,
    /// Newest lap first.
    pub laps: Vec<LapRow>,
    pub empty_message: Option<&'static str>,
    pub clear_laps_visible: bool,
    pub stats_visible: bool,
    pub stats: StatsView,
}

impl DisplayModel {
    pub fn from_state(state: &TimerState) -> Self {
        let running = state.is_running();
        let has_laps = !state.laps().is_empty();
        let stats = state.stats();

        let start_label = if running {
            "Running"
        } else if state.elapsed_ms() > 0 {
            "Resume"
        } else {
            "Start"
        };

        Self {
            time_text: format_time(state.elapsed_ms()),
            status: state.status().as_str(),
            start_label,
            start_enabled: !running,
            pause_enabled: running,
            lap_enabled: running,
            laps: state.laps().iter().rev().map(LapRow::from).collect(),
            empty_message: (!has_laps).then_some(NO_LAPS_MESSAGE),
            clear_laps_visible: has_laps,
            stats_visible: has_laps,
            stats: StatsView {
                total_laps: stats.count.to_string(),
                best_lap: stats
                    .best_ms
                    .map(format_time)
                    .unwrap_or_else(|| PLACEHOLDER_TIME.to_string()),
                average_lap: stats
                    .average_ms
                    .map(|avg| format_time(avg.floor() as u64))
                    .unwrap_or_else(|| PLACEHOLDER_TIME.to_string()),
            },
        }
    }
}

impl fmt::Display for DisplayModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] {}", self.status, self.time_text)?;
        match self.empty_message {
            Some(message) => writeln!(f, "  {message}")?,
            None => {
                for row in &self.laps {
                    writeln!(f, "  {}  {}  {}", row.label, row.total_text, row.split_text)?;
                }
            }
        }
        write!(
            f,
            "  laps: {}  best: {}  avg: {}",
            self.stats.total_laps, self.stats.best_lap, self.stats.average_lap
        )
    }
}
