use chrono::{DateTime, Local, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const SECS_IN_MIN: i64 = 60;
    pub const SECS_IN_H: i64 = Self::SECS_IN_MIN * 60;
    pub const SECS_IN_D: i64 = Self::SECS_IN_H * 24;
    pub const SECS_IN_W: i64 = Self::SECS_IN_D * 7;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d";
    pub const AXIS_TIME_FORMAT: &str = "%b %d";
    pub const FULL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

    /// Gateway-style duration string, e.g. `30 days`, `1 day`, `4 hours`.
    pub fn duration_string(seconds: i64) -> String {
        let (count, unit) = if seconds % Self::SECS_IN_W == 0 && seconds >= Self::SECS_IN_W * 2 {
            (seconds / Self::SECS_IN_W, "week")
        } else if seconds % Self::SECS_IN_D == 0 {
            (seconds / Self::SECS_IN_D, "day")
        } else if seconds % Self::SECS_IN_H == 0 {
            (seconds / Self::SECS_IN_H, "hour")
        } else if seconds % Self::SECS_IN_MIN == 0 {
            (seconds / Self::SECS_IN_MIN, "minute")
        } else {
            (seconds, "second")
        };
        if count == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", count, unit)
        }
    }
}

/// `2024-01-31` for an epoch in seconds, or an empty string if out of range.
pub fn epoch_sec_to_utc(epoch_sec: i64) -> String {
    format_epoch_sec(epoch_sec, TimeUtils::STANDARD_TIME_FORMAT)
}

/// Short axis label (`Jan 31`).
pub fn epoch_sec_to_axis_label(epoch_sec: i64) -> String {
    format_epoch_sec(epoch_sec, TimeUtils::AXIS_TIME_FORMAT)
}

pub fn format_epoch_sec(epoch_sec: i64, format: &str) -> String {
    match DateTime::<Utc>::from_timestamp(epoch_sec, 0) {
        Some(dt) => dt.format(format).to_string(),
        None => String::new(),
    }
}

pub fn local_now() -> DateTime<Local> {
    Local::now()
}

/// Compact "how long ago" used in the transaction history (`12s`, `4m`, `3h`, `2d`).
pub fn format_ago(past: DateTime<Local>, now: DateTime<Local>) -> String {
    let seconds = (now - past).num_seconds().max(0);
    if seconds < TimeUtils::SECS_IN_MIN {
        format!("{}s", seconds)
    } else if seconds < TimeUtils::SECS_IN_H {
        format!("{}m", seconds / TimeUtils::SECS_IN_MIN)
    } else if seconds < TimeUtils::SECS_IN_D {
        format!("{}h", seconds / TimeUtils::SECS_IN_H)
    } else {
        format!("{}d", seconds / TimeUtils::SECS_IN_D)
    }
}
