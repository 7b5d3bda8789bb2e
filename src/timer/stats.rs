use serde::Serialize;

use super::state::Lap;

/// Running statistics over lap splits.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LapStats {
    pub count: usize,
    /// Shortest split, `None` without laps.
    pub best_ms: Option<u64>,
    /// Mean split, `None` without laps.
    pub average_ms: Option<f64>,
}

impl LapStats {
    pub fn from_laps(laps: &[Lap]) -> Self {
        let count = laps.len();
        let best_ms = laps.iter().map(|lap| lap.split_ms).min();
        let average_ms = if count == 0 {
            None
        } else {
            let sum: u64 = laps.iter().map(|lap| lap.split_ms).sum();
            Some(sum as f64 / count as f64)
        };

        Self {
            count,
            best_ms,
            average_ms,
        }
    }
}
