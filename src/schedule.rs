use crate::period::{Period, PeriodDraft, new_id};
use crate::resolver::{self, Resolution};
use crate::validation::{self, ValidationError};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    Validation(ValidationError),
    PeriodNotFound(String),
    ScheduleNotFound(String),
    NoScheduleSelected,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::Validation(err) => write!(f, "{err}"),
            ScheduleError::PeriodNotFound(id) => write!(f, "period {id} not found"),
            ScheduleError::ScheduleNotFound(id) => write!(f, "schedule {id} not found"),
            ScheduleError::NoScheduleSelected => write!(f, "no schedule is selected"),
        }
    }
}

impl std::error::Error for ScheduleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScheduleError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ScheduleError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// A named collection of periods. Period order is not stored; views sort by
/// start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub periods: Vec<Period>,
}

impl Schedule {
    /// Creates an empty schedule with a fresh id. The name is trimmed and must
    /// not be blank.
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = validation::validate_schedule_name(name)?;
        Ok(Self {
            id: new_id(),
            name,
            periods: Vec::new(),
        })
    }

    pub fn sorted_periods(&self) -> Vec<&Period> {
        resolver::sorted_periods(&self.periods)
    }

    pub fn resolve(&self, now: NaiveTime) -> Resolution<'_> {
        resolver::resolve(&self.periods, now)
    }

    pub fn find_period(&self, period_id: &str) -> Option<&Period> {
        self.periods.iter().find(|p| p.id == period_id)
    }

    /// Validates the draft and appends a period with a fresh id.
    pub fn add_period(&mut self, draft: &PeriodDraft) -> Result<&Period, ScheduleError> {
        let fields = validation::validate_period_draft(draft)?;
        let mut id = new_id();
        while self.find_period(&id).is_some() {
            id = new_id();
        }
        self.periods.push(Period::from_fields(id, fields));
        Ok(&self.periods[self.periods.len() - 1])
    }

    /// Replaces every field of an existing period except its id.
    pub fn update_period(
        &mut self,
        period_id: &str,
        draft: &PeriodDraft,
    ) -> Result<&Period, ScheduleError> {
        let idx = self
            .periods
            .iter()
            .position(|p| p.id == period_id)
            .ok_or_else(|| ScheduleError::PeriodNotFound(period_id.to_string()))?;
        let fields = validation::validate_period_draft(draft)?;
        self.periods[idx] = Period::from_fields(period_id.to_string(), fields);
        Ok(&self.periods[idx])
    }

    /// Returns whether a period with `period_id` existed.
    pub fn delete_period(&mut self, period_id: &str) -> bool {
        let before = self.periods.len();
        self.periods.retain(|p| p.id != period_id);
        self.periods.len() != before
    }

    /// Pairs of overlapping periods, in start order. Overlaps are allowed; this
    /// exists so callers can warn about them.
    pub fn overlaps(&self) -> Vec<(&Period, &Period)> {
        let sorted = self.sorted_periods();
        let mut pairs = Vec::new();
        for (i, a) in sorted.iter().enumerate() {
            for b in sorted.iter().skip(i + 1) {
                if b.start_time >= a.end_time {
                    break;
                }
                if a.overlaps(b) {
                    pairs.push((*a, *b));
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> Schedule {
        Schedule::new("Fall").unwrap()
    }

    #[test]
    fn new_rejects_blank_name() {
        assert_eq!(
            Schedule::new("  "),
            Err(ValidationError::EmptyScheduleName)
        );
    }

    #[test]
    fn add_period_assigns_unique_ids() {
        let mut s = schedule();
        let a = s.add_period(&PeriodDraft::new("Math", "08:00", "09:00")).unwrap().id.clone();
        let b = s.add_period(&PeriodDraft::new("Art", "09:00", "10:00")).unwrap().id.clone();
        assert_ne!(a, b);
        assert_eq!(s.periods.len(), 2);
    }

    #[test]
    fn inverted_period_is_rejected_without_mutation() {
        let mut s = schedule();
        let err = s
            .add_period(&PeriodDraft::new("Math", "09:00", "08:00"))
            .unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::Validation(ValidationError::EndNotAfterStart { .. })
        ));
        assert!(s.periods.is_empty());
    }

    #[test]
    fn update_keeps_id_and_validates() {
        let mut s = schedule();
        let id = s
            .add_period(&PeriodDraft::new("Math", "08:00", "09:00"))
            .unwrap()
            .id
            .clone();
        let updated = s
            .update_period(&id, &PeriodDraft::new("Algebra", "08:10", "09:10").with_agenda("Quiz"))
            .unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(updated.name, "Algebra");
        assert_eq!(updated.agenda.as_deref(), Some("Quiz"));

        let err = s
            .update_period(&id, &PeriodDraft::new("Algebra", "10:00", "09:00"))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Validation(_)));
        assert_eq!(s.periods[0].name, "Algebra");

        assert_eq!(
            s.update_period("missing", &PeriodDraft::new("X", "08:00", "09:00")),
            Err(ScheduleError::PeriodNotFound("missing".into()))
        );
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let mut s = schedule();
        let id = s
            .add_period(&PeriodDraft::new("Math", "08:00", "09:00"))
            .unwrap()
            .id
            .clone();
        assert!(s.delete_period(&id));
        assert!(!s.delete_period(&id));
    }

    #[test]
    fn overlaps_lists_intersecting_pairs() {
        let mut s = schedule();
        s.add_period(&PeriodDraft::new("Homeroom", "08:00", "10:00")).unwrap();
        s.add_period(&PeriodDraft::new("Lab", "08:30", "09:00")).unwrap();
        s.add_period(&PeriodDraft::new("Lunch", "12:00", "12:30")).unwrap();
        let pairs = s.overlaps();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.name, "Homeroom");
        assert_eq!(pairs[0].1.name, "Lab");
    }
}
