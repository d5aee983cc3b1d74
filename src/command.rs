use crate::period::{Period, PeriodDraft};
use crate::schedule::ScheduleError;
use crate::transfer::{ImportReport, TransferError};
use serde::{Deserialize, Serialize};

/// A user request against the schedule book. Front ends collect input however
/// they like and submit one of these; the planner answers with an [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    SelectSchedule {
        schedule_id: String,
    },
    AddSchedule {
        name: String,
    },
    RenameSchedule {
        schedule_id: String,
        name: String,
    },
    /// Unconfirmed deletes only ask for confirmation; nothing is removed until
    /// the same command arrives with `confirmed: true`.
    DeleteSchedule {
        schedule_id: String,
        #[serde(default)]
        confirmed: bool,
    },
    /// Adds to the selected schedule.
    AddPeriod {
        draft: PeriodDraft,
    },
    /// Adds to the named schedule and leaves the selection alone.
    AddPeriodTo {
        schedule_id: String,
        draft: PeriodDraft,
    },
    UpdatePeriod {
        period_id: String,
        draft: PeriodDraft,
    },
    DeletePeriod {
        period_id: String,
    },
    DeletePeriodFrom {
        schedule_id: String,
        period_id: String,
    },
    ImportSchedule {
        document: String,
    },
    ImportPeriods {
        drafts: Vec<PeriodDraft>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Selected {
        schedule_id: String,
    },
    ScheduleAdded {
        schedule_id: String,
        name: String,
    },
    Renamed {
        schedule_id: String,
        name: String,
    },
    /// The request was valid but left everything as it was.
    Unchanged,
    ConfirmationRequired {
        schedule_id: String,
        prompt: String,
    },
    ScheduleDeleted {
        schedule_id: String,
        name: String,
        selected_id: Option<String>,
    },
    PeriodAdded {
        period: Period,
    },
    PeriodUpdated {
        period: Period,
    },
    PeriodDeleted {
        period_id: String,
    },
    Imported {
        report: ImportReport,
    },
    PeriodsImported {
        count: usize,
    },
}

impl Outcome {
    pub fn changed_state(&self) -> bool {
        !matches!(
            self,
            Outcome::Unchanged | Outcome::ConfirmationRequired { .. }
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_deserialize_from_tagged_json() {
        let cmd: Command = serde_json::from_str(
            r#"{"type":"delete_schedule","schedule_id":"s1"}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::DeleteSchedule {
                schedule_id: "s1".into(),
                confirmed: false
            }
        );

        let cmd: Command = serde_json::from_str(
            r#"{"type":"add_period_to","schedule_id":"s2","draft":{"name":"Math","startTime":"08:00","endTime":"09:00"}}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::AddPeriodTo {
                schedule_id: "s2".into(),
                draft: PeriodDraft::new("Math", "08:00", "09:00"),
            }
        );
    }

    #[test]
    fn unchanged_outcomes_do_not_count_as_changes() {
        assert!(!Outcome::Unchanged.changed_state());
        assert!(
            !Outcome::ConfirmationRequired {
                schedule_id: "s".into(),
                prompt: "?".into()
            }
            .changed_state()
        );
        assert!(
            Outcome::PeriodDeleted {
                period_id: "p".into()
            }
            .changed_state()
        );
    }
}
