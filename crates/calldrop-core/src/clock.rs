//! Call close-time estimation from the clock lines a glider prints.
//!
//! A terminal transcript carries occasional wall-clock lines
//! (`Curr Time: Sat May 12 04:25:39 2018 MT:  116230`) and many lines
//! prefixed with the mission-time counter in seconds. The last wall-clock
//! line plus the mission time elapsed after it approximates when the call
//! ended.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static CLOCK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^Curr Time: [A-Z][a-z]{2} ([A-Z][a-z]{2} +\d+ \d{2}:\d{2}:\d{2} \d{4}) MT: +(\d+)\r?$",
    )
    .unwrap()
});

static MISSION_TIME_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^ *(\d+) +.+$").unwrap());

/// A wall-clock line paired with the mission time it was printed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading {
    /// Wall clock, assumed UTC
    pub wall: DateTime<Utc>,
    /// Mission-time counter in seconds
    pub mission_secs: u64,
}

/// Last wall-clock reading in the transcript
pub fn last_clock_reading(text: &str) -> Option<ClockReading> {
    let caps = CLOCK_LINE.captures_iter(text).last()?;
    // Single-digit days are space padded
    let stamp = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
    let wall = NaiveDateTime::parse_from_str(&stamp, "%b %d %H:%M:%S %Y")
        .ok()?
        .and_utc();
    let mission_secs = caps[2].parse().ok()?;
    Some(ClockReading { wall, mission_secs })
}

/// Mission-time counter of the last counter-prefixed line
pub fn last_mission_time(text: &str) -> Option<u64> {
    let caps = MISSION_TIME_LINE.captures_iter(text).last()?;
    caps[1].parse().ok()
}

/// Estimate when the call ended.
///
/// `None` when the transcript has no usable wall-clock line.
pub fn estimate_close_time(text: &str) -> Option<DateTime<Utc>> {
    let reading = last_clock_reading(text)?;
    let close = match last_mission_time(text) {
        Some(last) if last > reading.mission_secs => elapsed_since(&reading, last)
            .and_then(|elapsed| reading.wall.checked_add_signed(elapsed))
            .unwrap_or(reading.wall),
        _ => reading.wall,
    };
    Some(close)
}

/// Mission time elapsed after a reading; `None` when it is not representable
fn elapsed_since(reading: &ClockReading, mission_secs: u64) -> Option<Duration> {
    let secs = i64::try_from(mission_secs.checked_sub(reading.mission_secs)?).ok()?;
    Duration::try_seconds(secs)
}
