use crate::period::PeriodDraft;
use crate::time_of_day::{ParseTimeError, TimeOfDay};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("All fields are required.")]
    EmptyPeriodName,
    #[error("All fields are required. ({field} is missing)")]
    MissingTime { field: &'static str },
    #[error(transparent)]
    InvalidTime(#[from] ParseTimeError),
    #[error("End time must be after start time. ({start} >= {end})")]
    EndNotAfterStart { start: TimeOfDay, end: TimeOfDay },
    #[error("Schedule name cannot be blank.")]
    EmptyScheduleName,
}

/// Field values that passed form validation, ready to become a `Period`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodFields {
    pub name: String,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub agenda: Option<String>,
}

fn parse_required_time(raw: &str, field: &'static str) -> Result<TimeOfDay, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::MissingTime { field });
    }
    Ok(raw.parse()?)
}

pub fn validate_time_range(start: TimeOfDay, end: TimeOfDay) -> Result<(), ValidationError> {
    if start >= end {
        return Err(ValidationError::EndNotAfterStart { start, end });
    }
    Ok(())
}

pub fn validate_period_draft(draft: &PeriodDraft) -> Result<PeriodFields, ValidationError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyPeriodName);
    }
    let start_time = parse_required_time(&draft.start_time, "start time")?;
    let end_time = parse_required_time(&draft.end_time, "end time")?;
    validate_time_range(start_time, end_time)?;

    let agenda = draft
        .agenda
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    Ok(PeriodFields {
        name: name.to_string(),
        start_time,
        end_time,
        agenda,
    })
}

pub fn validate_schedule_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyScheduleName);
    }
    Ok(trimmed.to_string())
}
