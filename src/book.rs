use crate::period::{Period, PeriodDraft, new_id};
use crate::schedule::{Schedule, ScheduleError};
use crate::transfer::PLACEHOLDER_PERIOD_NAME;
use crate::validation;
use log::{info, warn};
use std::collections::HashSet;

pub const DEFAULT_SCHEDULE_NAME: &str = "My First Schedule";
pub const PLACEHOLDER_SCHEDULE_NAME: &str = "Untitled Schedule";

/// Every schedule the user owns plus which one is selected.
///
/// Whenever `schedules` is non-empty the selection names one of them; it is
/// `None` only for an empty book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleBook {
    schedules: Vec<Schedule>,
    selected_id: Option<String>,
}

impl ScheduleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a book from stored parts. Each record is repaired on its own so
    /// one damaged entry never costs the others: blank or duplicate ids are
    /// regenerated, blank names get placeholders, and periods whose end is not
    /// after their start are dropped. A stale or missing selection falls back
    /// to the first schedule.
    ///
    /// Returns the book and how many records were repaired.
    pub fn from_parts(mut schedules: Vec<Schedule>, selected_id: Option<String>) -> (Self, usize) {
        let repairs = repair_records(&mut schedules);
        let mut book = Self {
            schedules,
            selected_id,
        };
        book.repair_selection();
        (book, repairs)
    }

    pub fn schedules(&self) -> &[Schedule] {
        &self.schedules
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected(&self) -> Option<&Schedule> {
        let id = self.selected_id.as_deref()?;
        self.find(id)
    }

    pub fn find(&self, schedule_id: &str) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.id == schedule_id)
    }

    pub fn contains(&self, schedule_id: &str) -> bool {
        self.find(schedule_id).is_some()
    }

    fn find_mut(&mut self, schedule_id: &str) -> Result<&mut Schedule, ScheduleError> {
        self.schedules
            .iter_mut()
            .find(|s| s.id == schedule_id)
            .ok_or_else(|| ScheduleError::ScheduleNotFound(schedule_id.to_string()))
    }

    fn selected_key(&self) -> Result<String, ScheduleError> {
        self.selected_id
            .clone()
            .ok_or(ScheduleError::NoScheduleSelected)
    }

    /// Points the selection at the first schedule when it is missing or stale.
    /// Returns whether the selection changed.
    pub fn repair_selection(&mut self) -> bool {
        let valid = self
            .selected_id
            .as_deref()
            .is_some_and(|id| self.contains(id));
        if valid {
            return false;
        }
        let replacement = self.schedules.first().map(|s| s.id.clone());
        if replacement == self.selected_id {
            return false;
        }
        if let Some(stale) = &self.selected_id {
            warn!("event=selection_repaired stale_id={stale}");
        }
        self.selected_id = replacement;
        true
    }

    /// Seeds an empty book with a default schedule. Returns whether one was added.
    pub fn ensure_default_schedule(&mut self) -> bool {
        if !self.schedules.is_empty() {
            return false;
        }
        let schedule = Schedule {
            id: new_id(),
            name: DEFAULT_SCHEDULE_NAME.to_string(),
            periods: Vec::new(),
        };
        info!("event=default_schedule_created id={}", schedule.id);
        self.selected_id = Some(schedule.id.clone());
        self.schedules.push(schedule);
        true
    }

    pub fn select(&mut self, schedule_id: &str) -> Result<(), ScheduleError> {
        if !self.contains(schedule_id) {
            return Err(ScheduleError::ScheduleNotFound(schedule_id.to_string()));
        }
        self.selected_id = Some(schedule_id.to_string());
        Ok(())
    }

    /// Adds a new, empty schedule and selects it.
    pub fn add_schedule(&mut self, name: &str) -> Result<&Schedule, ScheduleError> {
        let mut schedule = Schedule::new(name)?;
        while self.contains(&schedule.id) {
            schedule.id = new_id();
        }
        self.selected_id = Some(schedule.id.clone());
        self.schedules.push(schedule);
        Ok(&self.schedules[self.schedules.len() - 1])
    }

    /// Renames a schedule. Returns `false` when the trimmed name is unchanged.
    pub fn rename_schedule(&mut self, schedule_id: &str, name: &str) -> Result<bool, ScheduleError> {
        let name = validation::validate_schedule_name(name)?;
        let schedule = self.find_mut(schedule_id)?;
        if schedule.name == name {
            return Ok(false);
        }
        schedule.name = name;
        Ok(true)
    }

    /// Removes a schedule. When it was selected, the selection moves to the
    /// first remaining schedule, or to `None` when the book is now empty.
    pub fn delete_schedule(&mut self, schedule_id: &str) -> Result<Schedule, ScheduleError> {
        let idx = self
            .schedules
            .iter()
            .position(|s| s.id == schedule_id)
            .ok_or_else(|| ScheduleError::ScheduleNotFound(schedule_id.to_string()))?;
        let removed = self.schedules.remove(idx);
        if self.selected_id.as_deref() == Some(schedule_id) {
            self.selected_id = self.schedules.first().map(|s| s.id.clone());
        }
        Ok(removed)
    }

    pub fn add_period(&mut self, draft: &PeriodDraft) -> Result<&Period, ScheduleError> {
        let id = self.selected_key()?;
        self.add_period_to(&id, draft)
    }

    /// Adds a period to any schedule without touching the selection.
    pub fn add_period_to(
        &mut self,
        schedule_id: &str,
        draft: &PeriodDraft,
    ) -> Result<&Period, ScheduleError> {
        self.find_mut(schedule_id)?.add_period(draft)
    }

    pub fn update_period(
        &mut self,
        period_id: &str,
        draft: &PeriodDraft,
    ) -> Result<&Period, ScheduleError> {
        let id = self.selected_key()?;
        self.find_mut(&id)?.update_period(period_id, draft)
    }

    pub fn delete_period(&mut self, period_id: &str) -> Result<(), ScheduleError> {
        let id = self.selected_key()?;
        self.delete_period_from(&id, period_id)
    }

    pub fn delete_period_from(
        &mut self,
        schedule_id: &str,
        period_id: &str,
    ) -> Result<(), ScheduleError> {
        if self.find_mut(schedule_id)?.delete_period(period_id) {
            Ok(())
        } else {
            Err(ScheduleError::PeriodNotFound(period_id.to_string()))
        }
    }

    /// Inserts an already validated schedule (e.g. from an import) and selects
    /// it. The caller guarantees the id is not already taken.
    pub(crate) fn insert_schedule(&mut self, schedule: Schedule) -> &Schedule {
        self.selected_id = Some(schedule.id.clone());
        self.schedules.push(schedule);
        &self.schedules[self.schedules.len() - 1]
    }
}

fn fresh_id(taken: &HashSet<String>) -> String {
    let mut id = new_id();
    while taken.contains(&id) {
        id = new_id();
    }
    id
}

fn repair_records(schedules: &mut [Schedule]) -> usize {
    let mut repairs = 0;
    let mut schedule_ids = HashSet::with_capacity(schedules.len());
    for schedule in schedules.iter_mut() {
        if schedule.id.trim().is_empty() || schedule_ids.contains(&schedule.id) {
            let id = fresh_id(&schedule_ids);
            warn!("event=stored_schedule_id_regenerated stale_id={} id={id}", schedule.id);
            schedule.id = id;
            repairs += 1;
        }
        schedule_ids.insert(schedule.id.clone());

        if schedule.name.trim().is_empty() {
            warn!("event=stored_schedule_name_defaulted id={}", schedule.id);
            schedule.name = PLACEHOLDER_SCHEDULE_NAME.to_string();
            repairs += 1;
        }

        let before = schedule.periods.len();
        schedule.periods.retain(|period| {
            let valid = validation::validate_time_range(period.start_time, period.end_time).is_ok();
            if !valid {
                warn!(
                    "event=stored_period_dropped schedule={} period={}",
                    schedule.id, period.id
                );
            }
            valid
        });
        repairs += before - schedule.periods.len();

        let mut period_ids = HashSet::with_capacity(schedule.periods.len());
        for period in &mut schedule.periods {
            if period.id.trim().is_empty() || period_ids.contains(&period.id) {
                period.id = fresh_id(&period_ids);
                repairs += 1;
            }
            period_ids.insert(period.id.clone());
            if period.name.trim().is_empty() {
                period.name = PLACEHOLDER_PERIOD_NAME.to_string();
                repairs += 1;
            }
        }
    }
    repairs
}
