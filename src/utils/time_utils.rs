use chrono::{DateTime, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_3_MIN: i64 = Self::MS_IN_S * 60 * 3;
    pub const MS_IN_5_MIN: i64 = Self::MS_IN_S * 60 * 5;
    pub const MS_IN_15_MIN: i64 = Self::MS_IN_S * 60 * 15;
    pub const MS_IN_30_MIN: i64 = Self::MS_IN_S * 60 * 30;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_4_H: i64 = Self::MS_IN_MIN * 60 * 4;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;
    pub const MS_IN_W: i64 = Self::MS_IN_D * 7;

    /// Format used for the time axis of intraday charts.
    pub const AXIS_TIME_FORMAT: &str = "%m-%d %H:%M";
    /// Format used for the time axis once bars are a day or wider.
    pub const AXIS_DATE_FORMAT: &str = "%Y-%m-%d";
}

/// Axis label for a bar open time. Falls back to the raw value if chrono rejects it.
pub fn axis_label(epoch_ms: i64, interval_ms: i64) -> String {
    let format = if interval_ms >= TimeUtils::MS_IN_D {
        TimeUtils::AXIS_DATE_FORMAT
    } else {
        TimeUtils::AXIS_TIME_FORMAT
    };
    match DateTime::<Utc>::from_timestamp_millis(epoch_ms) {
        Some(dt) => dt.format(format).to_string(),
        None => epoch_ms.to_string(),
    }
}

pub fn epoch_ms_to_utc(epoch_ms: i64) -> String {
    // Used for log lines
    match DateTime::<Utc>::from_timestamp_millis(epoch_ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intraday_labels_show_time_of_day() {
        // 2024-01-02 03:15:00 UTC
        let ms = 1_704_165_300_000;
        assert_eq!(axis_label(ms, TimeUtils::MS_IN_15_MIN), "01-02 03:15");
    }

    #[test]
    fn daily_labels_show_the_date() {
        let ms = 1_704_165_300_000;
        assert_eq!(axis_label(ms, TimeUtils::MS_IN_D), "2024-01-02");
    }
}
