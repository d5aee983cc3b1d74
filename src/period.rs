use crate::time_of_day::TimeOfDay;
use crate::validation::PeriodFields;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_START_TIME: &str = "08:00";
pub const DEFAULT_END_TIME: &str = "09:00";

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A named, time-bounded interval within a schedule. `start_time < end_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub id: String,
    pub name: String,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agenda: Option<String>,
}

impl Period {
    pub(crate) fn from_fields(id: String, fields: PeriodFields) -> Self {
        Self {
            id,
            name: fields.name,
            start_time: fields.start_time,
            end_time: fields.end_time,
            agenda: fields.agenda,
        }
    }

    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start_time,
            end_time,
            agenda: None,
        }
    }

    /// Half-open containment: start inclusive, end exclusive.
    pub fn contains(&self, time: TimeOfDay) -> bool {
        self.start_time <= time && time < self.end_time
    }

    pub fn overlaps(&self, other: &Period) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }

    pub fn time_range_12h(&self) -> String {
        format!("{} - {}", self.start_time.to_12h(), self.end_time.to_12h())
    }
}

/// Raw user input for creating or editing a period, validated by
/// [`crate::validation::validate_period_draft`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDraft {
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub agenda: Option<String>,
}

impl PeriodDraft {
    pub fn new(
        name: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            agenda: None,
        }
    }

    pub fn with_agenda(mut self, agenda: impl Into<String>) -> Self {
        self.agenda = Some(agenda.into());
        self
    }

    pub fn from_period(period: &Period) -> Self {
        Self {
            name: period.name.clone(),
            start_time: period.start_time.to_string(),
            end_time: period.end_time.to_string(),
            agenda: period.agenda.clone(),
        }
    }

    /// Blank draft pre-filled with the slot after `previous`: it starts when
    /// `previous` ends and runs one hour, clamped to the end of the day.
    pub fn following(previous: &Period) -> Self {
        let start = previous.end_time;
        let end = start.saturating_add_hours(1);
        Self::new("", start.to_string(), end.to_string())
    }

    /// Empty form state: no name, 08:00 to 09:00.
    pub fn blank() -> Self {
        Self::new("", DEFAULT_START_TIME, DEFAULT_END_TIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn containment_is_half_open() {
        let p = Period::with_id("1", "Math", t("08:00"), t("09:00"));
        assert!(p.contains(t("08:00")));
        assert!(p.contains(t("08:59")));
        assert!(!p.contains(t("09:00")));
        assert!(!p.contains(t("07:59")));
    }

    #[test]
    fn touching_periods_do_not_overlap() {
        let a = Period::with_id("1", "Math", t("08:00"), t("09:00"));
        let b = Period::with_id("2", "Science", t("09:00"), t("10:00"));
        let c = Period::with_id("3", "Lab", t("08:30"), t("09:30"));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn following_draft_starts_at_previous_end() {
        let p = Period::with_id("1", "Math", t("08:00"), t("09:15"));
        let next = PeriodDraft::following(&p);
        assert_eq!(next.start_time, "09:15");
        assert_eq!(next.end_time, "10:15");
        assert!(next.name.is_empty());
    }

    #[test]
    fn following_draft_clamps_late_slots() {
        let p = Period::with_id("1", "Study hall", t("22:00"), t("23:30"));
        assert_eq!(PeriodDraft::following(&p).end_time, "23:59");
    }

    #[test]
    fn period_json_uses_camel_case_fields() {
        let mut p = Period::with_id("abc", "Math", t("08:00"), t("09:00"));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["startTime"], "08:00");
        assert!(json.get("agenda").is_none());
        p.agenda = Some("Chapter 4".into());
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["agenda"], "Chapter 4");
    }
}
