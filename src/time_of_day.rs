use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock time on a 24-hour scale at minute resolution.
///
/// Stored as minutes since midnight so ordering is numeric; serialised as a
/// zero-padded `HH:MM` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    minutes: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time '{input}' (expected HH:MM)")]
pub struct ParseTimeError {
    input: String,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { minutes: 0 };
    pub const LAST_MINUTE: TimeOfDay = TimeOfDay {
        minutes: MINUTES_PER_DAY - 1,
    };

    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }
        Some(Self {
            minutes: (hour * 60 + minute) as u16,
        })
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.minutes / 60)
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.minutes % 60)
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        u32::from(self.minutes)
    }

    pub fn seconds_since_midnight(&self) -> u32 {
        self.minutes_since_midnight() * 60
    }

    /// Truncates a clock reading to the minute; seconds are dropped.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            minutes: (time.hour() * 60 + time.minute()) as u16,
        }
    }

    /// Adds whole hours, saturating at 23:59 instead of wrapping past midnight.
    pub fn saturating_add_hours(&self, hours: u32) -> Self {
        let minutes = self.minutes_since_midnight() + hours * 60;
        if minutes >= u32::from(MINUTES_PER_DAY) {
            Self::LAST_MINUTE
        } else {
            Self {
                minutes: minutes as u16,
            }
        }
    }

    /// 12-hour rendering used by the status and list views, e.g. `8:05 AM`.
    pub fn to_12h(&self) -> String {
        let hour = self.hour();
        let suffix = if hour >= 12 { "PM" } else { "AM" };
        let display_hour = match hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{}:{:02} {}", display_hour, self.minute(), suffix)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimeError {
            input: s.to_string(),
        };
        let trimmed = s.trim();
        let (hour_s, minute_s) = trimmed.split_once(':').ok_or_else(err)?;
        if hour_s.is_empty() || hour_s.len() > 2 || minute_s.len() != 2 {
            return Err(err());
        }
        if !hour_s.bytes().chain(minute_s.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let hour: u32 = hour_s.parse().map_err(|_| err())?;
        let minute: u32 = minute_s.parse().map_err(|_| err())?;
        TimeOfDay::new(hour, minute).ok_or_else(err)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_formats_zero_padded() {
        assert_eq!(t("08:05").to_string(), "08:05");
        assert_eq!(t("8:05").to_string(), "08:05");
        assert_eq!(t("23:59").minutes_since_midnight(), 23 * 60 + 59);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "8", "24:00", "12:60", "ab:cd", "12:5", "-1:00", "12:00:00"] {
            assert!(bad.parse::<TimeOfDay>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn ordering_matches_clock_order() {
        assert!(t("08:59") < t("09:00"));
        assert!(t("9:00") > t("08:30"));
    }

    #[test]
    fn twelve_hour_rendering() {
        assert_eq!(t("00:30").to_12h(), "12:30 AM");
        assert_eq!(t("08:05").to_12h(), "8:05 AM");
        assert_eq!(t("12:00").to_12h(), "12:00 PM");
        assert_eq!(t("15:45").to_12h(), "3:45 PM");
    }

    #[test]
    fn add_hours_saturates_at_end_of_day() {
        assert_eq!(t("09:15").saturating_add_hours(1), t("10:15"));
        assert_eq!(t("23:30").saturating_add_hours(1), TimeOfDay::LAST_MINUTE);
    }

    #[test]
    fn seconds_are_dropped_from_clock_readings() {
        let now = NaiveTime::from_hms_opt(8, 59, 59).unwrap();
        assert_eq!(TimeOfDay::from_naive_time(now), t("08:59"));
    }

    #[test]
    fn serde_uses_hhmm_strings() {
        let json = serde_json::to_string(&t("07:00")).unwrap();
        assert_eq!(json, "\"07:00\"");
        let back: TimeOfDay = serde_json::from_str("\"13:20\"").unwrap();
        assert_eq!(back, t("13:20"));
        assert!(serde_json::from_str::<TimeOfDay>("\"25:00\"").is_err());
    }
}
