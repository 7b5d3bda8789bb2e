use serde::{Deserialize, Serialize};

use super::stats::LapStats;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Stopped,
    Paused,
    Running,
}

impl TimerStatus {
    /// Indicator class the presentation layer styles the status dot with.
    pub fn as_str(self) -> &'static str {
        match self {
            TimerStatus::Stopped => "stopped",
            TimerStatus::Paused => "paused",
            TimerStatus::Running => "running",
        }
    }
}

/// A recorded checkpoint. Never mutated after it is pushed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Lap {
    /// 1-based position in the lap list.
    pub number: u32,
    /// Elapsed time when the lap was recorded.
    pub total_ms: u64,
    /// Time since the previous lap, or since the start for the first one.
    pub split_ms: u64,
}

/// All timing state of one stopwatch.
///
/// Every mutation goes through the methods below; `tick` is the only one
/// that advances time and is driven by an external scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    elapsed_ms: u64,
    status: TimerStatus,
    laps: Vec<Lap>,
    /// `total_ms` of the last lap, or 0 when there are none.
    last_lap_mark_ms: u64,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    pub fn last_lap_mark_ms(&self) -> u64 {
        self.last_lap_mark_ms
    }

    pub fn stats(&self) -> LapStats {
        LapStats::from_laps(&self.laps)
    }

    /// Returns `true` if the timer transitioned into running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.status = TimerStatus::Running;
        true
    }

    /// Returns `true` if the timer was running and is now paused.
    pub fn pause(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.status = TimerStatus::Paused;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records a lap at the current elapsed time. No-op while not running.
    pub fn lap(&mut self) -> Option<Lap> {
        if !self.is_running() {
            return None;
        }
        let lap = Lap {
            number: next_lap_number(self.laps.len()),
            total_ms: self.elapsed_ms,
            split_ms: self.elapsed_ms.saturating_sub(self.last_lap_mark_ms),
        };
        self.laps.push(lap);
        self.last_lap_mark_ms = self.elapsed_ms;
        Some(lap)
    }

    pub fn clear_laps(&mut self) {
        self.laps.clear();
        self.last_lap_mark_ms = 0;
    }

    pub fn tick(&mut self, delta_ms: u64) {
        if self.is_running() {
            self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        }
    }
}

/// 1-based number for the lap after `recorded` laps, saturating at `u32::MAX`.
fn next_lap_number(recorded: usize) -> u32 {
    u32::try_from(recorded)
        .unwrap_or(u32::MAX)
        .saturating_add(1)
}
