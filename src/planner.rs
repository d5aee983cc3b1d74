use crate::book::ScheduleBook;
use crate::command::{Command, CommandError, Outcome};
use crate::period::{Period, PeriodDraft};
use crate::persistence::{self, KeyValueStore};
use crate::resolver::PeriodProgress;
use crate::schedule::{Schedule, ScheduleError};
use crate::time_of_day::TimeOfDay;
use crate::transfer;
use chrono::NaiveTime;
use log::{error, info, warn};
use serde::Serialize;

/// Owns the schedule book and the store it is persisted to.
///
/// Every successful mutation is followed by a best-effort save; a failed save
/// is logged and remembered but the in-memory change stands.
pub struct Planner {
    book: ScheduleBook,
    store: Box<dyn KeyValueStore>,
    last_persist_error: Option<String>,
    next_draft: PeriodDraft,
}

impl Planner {
    /// Loads the book from `store`. Damaged records are repaired one by one;
    /// contents that cannot be read at all degrade to an empty book. An empty
    /// book is seeded with a default schedule.
    ///
    /// Repairs and seeding are written back only when the load succeeded, so
    /// unreadable contents stay in the store until the first real change.
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        let (book, repairs) = match persistence::load_book_repaired(store.as_ref()) {
            Ok((book, repairs)) => (book, Some(repairs)),
            Err(err) => {
                error!("event=book_load_failed error={err}");
                (ScheduleBook::new(), None)
            }
        };
        let mut planner = Self {
            book,
            store,
            last_persist_error: None,
            next_draft: PeriodDraft::blank(),
        };
        let seeded = planner.book.ensure_default_schedule();
        let reselected = planner.book.repair_selection();
        match repairs {
            Some(repairs) if seeded || reselected || repairs > 0 => {
                planner.persist();
            }
            Some(_) => {}
            None => warn!("event=book_save_deferred reason=load_failed"),
        }
        info!(
            "event=planner_opened schedules={} selected={}",
            planner.book.len(),
            planner.book.selected_id().unwrap_or("-")
        );
        planner
    }

    pub fn book(&self) -> &ScheduleBook {
        &self.book
    }

    pub fn selected(&self) -> Option<&Schedule> {
        self.book.selected()
    }

    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    /// Form state for the next period: picks up where the most recently added
    /// period ends, or the 08:00-09:00 default before anything was added.
    pub fn suggest_next_draft(&self) -> &PeriodDraft {
        &self.next_draft
    }

    /// Writes the book to the store. Returns whether the save succeeded.
    pub fn persist(&mut self) -> bool {
        match persistence::save_book(self.store.as_mut(), &self.book) {
            Ok(()) => {
                self.last_persist_error = None;
                true
            }
            Err(err) => {
                error!("event=book_save_failed error={err}");
                self.last_persist_error = Some(err.to_string());
                false
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome, CommandError> {
        let outcome = self.apply(command)?;
        if outcome.changed_state() {
            self.persist();
        }
        Ok(outcome)
    }

    fn apply(&mut self, command: Command) -> Result<Outcome, CommandError> {
        let outcome = match command {
            Command::SelectSchedule { schedule_id } => {
                self.book.select(&schedule_id)?;
                Outcome::Selected { schedule_id }
            }
            Command::AddSchedule { name } => {
                let schedule = self.book.add_schedule(&name)?;
                info!("event=schedule_added id={}", schedule.id);
                Outcome::ScheduleAdded {
                    schedule_id: schedule.id.clone(),
                    name: schedule.name.clone(),
                }
            }
            Command::RenameSchedule { schedule_id, name } => {
                if self.book.rename_schedule(&schedule_id, &name)? {
                    let name = self
                        .book
                        .find(&schedule_id)
                        .map(|s| s.name.clone())
                        .unwrap_or_default();
                    info!("event=schedule_renamed id={schedule_id}");
                    Outcome::Renamed { schedule_id, name }
                } else {
                    Outcome::Unchanged
                }
            }
            Command::DeleteSchedule {
                schedule_id,
                confirmed: false,
            } => {
                let schedule = self
                    .book
                    .find(&schedule_id)
                    .ok_or_else(|| ScheduleError::ScheduleNotFound(schedule_id.clone()))?;
                let prompt = format!(
                    "Are you sure you want to delete the \"{}\" schedule? This action cannot be undone.",
                    schedule.name
                );
                Outcome::ConfirmationRequired {
                    schedule_id,
                    prompt,
                }
            }
            Command::DeleteSchedule {
                schedule_id,
                confirmed: true,
            } => {
                let removed = self.book.delete_schedule(&schedule_id)?;
                info!("event=schedule_deleted id={schedule_id}");
                self.book.ensure_default_schedule();
                Outcome::ScheduleDeleted {
                    schedule_id,
                    name: removed.name,
                    selected_id: self.book.selected_id().map(str::to_string),
                }
            }
            Command::AddPeriod { draft } => {
                let schedule_id = self
                    .book
                    .selected_id()
                    .ok_or(ScheduleError::NoScheduleSelected)?
                    .to_string();
                self.add_period_to(&schedule_id, &draft)?
            }
            Command::AddPeriodTo { schedule_id, draft } => {
                self.add_period_to(&schedule_id, &draft)?
            }
            Command::UpdatePeriod { period_id, draft } => {
                let period = self.book.update_period(&period_id, &draft)?.clone();
                info!("event=period_updated id={period_id}");
                if let Some(schedule) = self.book.selected() {
                    warn_on_overlaps(schedule);
                }
                Outcome::PeriodUpdated { period }
            }
            Command::DeletePeriod { period_id } => {
                self.book.delete_period(&period_id)?;
                info!("event=period_deleted id={period_id}");
                Outcome::PeriodDeleted { period_id }
            }
            Command::DeletePeriodFrom {
                schedule_id,
                period_id,
            } => {
                self.book.delete_period_from(&schedule_id, &period_id)?;
                info!("event=period_deleted id={period_id} schedule={schedule_id}");
                Outcome::PeriodDeleted { period_id }
            }
            Command::ImportSchedule { document } => {
                let report = transfer::import_schedule(&mut self.book, &document)?;
                Outcome::Imported { report }
            }
            Command::ImportPeriods { drafts } => {
                let count = transfer::import_period_drafts(&mut self.book, &drafts)?;
                info!("event=periods_imported count={count}");
                Outcome::PeriodsImported { count }
            }
        };
        Ok(outcome)
    }

    fn add_period_to(
        &mut self,
        schedule_id: &str,
        draft: &PeriodDraft,
    ) -> Result<Outcome, ScheduleError> {
        let period = self.book.add_period_to(schedule_id, draft)?.clone();
        info!("event=period_added id={} schedule={schedule_id}", period.id);
        if let Some(schedule) = self.book.find(schedule_id) {
            warn_on_overlaps(schedule);
        }
        self.next_draft = PeriodDraft::following(&period);
        Ok(Outcome::PeriodAdded { period })
    }

    pub fn status(&self, now: NaiveTime) -> ScheduleStatus {
        ScheduleStatus::at(self.book.selected(), now)
    }
}

fn warn_on_overlaps(schedule: &Schedule) {
    for (a, b) in schedule.overlaps() {
        warn!(
            "event=periods_overlap schedule={} first={} second={}",
            schedule.id, a.id, b.id
        );
    }
}

/// Owned snapshot of what is happening in a schedule at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleStatus {
    pub schedule_id: Option<String>,
    pub schedule_name: Option<String>,
    pub now: TimeOfDay,
    pub active: Option<Period>,
    pub next: Option<Period>,
    pub progress: Option<PeriodProgress>,
}

impl ScheduleStatus {
    pub fn at(schedule: Option<&Schedule>, now: NaiveTime) -> Self {
        let Some(schedule) = schedule else {
            return Self {
                schedule_id: None,
                schedule_name: None,
                now: TimeOfDay::from_naive_time(now),
                active: None,
                next: None,
                progress: None,
            };
        };
        let resolution = schedule.resolve(now);
        Self {
            schedule_id: Some(schedule.id.clone()),
            schedule_name: Some(schedule.name.clone()),
            now: TimeOfDay::from_naive_time(now),
            active: resolution.active.cloned(),
            next: resolution.next.cloned(),
            progress: resolution
                .active
                .map(|period| PeriodProgress::compute(period, now)),
        }
    }
}
