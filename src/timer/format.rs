/// Shown in place of a statistic that has no value yet.
pub const PLACEHOLDER_TIME: &str = "--:--.--";

/// Format milliseconds as "MM:SS.CC". Minutes are not capped at two digits.
pub fn format_time(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let centis = (ms % 1000) / 10;
    format!("{:02}:{:02}.{:02}", minutes, seconds, centis)
}
