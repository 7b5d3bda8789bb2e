pub mod commands;
pub mod controller;
pub mod format;
pub mod scheduler;
pub mod state;
pub mod stats;

pub use controller::{TimerController, TimerSnapshot};
pub use format::{format_time, PLACEHOLDER_TIME};
pub use scheduler::{ScheduleHandle, Scheduler, TickCallback, TokioScheduler};
pub use state::{Lap, TimerState, TimerStatus};
pub use stats::LapStats;
