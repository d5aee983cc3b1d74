//! Schedule import/export: single-schedule JSON documents and per-schedule
//! period CSV files.

use crate::book::ScheduleBook;
use crate::period::{DEFAULT_END_TIME, DEFAULT_START_TIME, Period, PeriodDraft, new_id};
use crate::schedule::{Schedule, ScheduleError};
use crate::time_of_day::TimeOfDay;
use crate::validation::{self, ValidationError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

pub const PLACEHOLDER_PERIOD_NAME: &str = "Untitled Period";
pub const IMPORTED_NAME_SUFFIX: &str = " (Imported)";

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("import file is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("invalid schedule document: {0}")]
    InvalidShape(String),
    #[error("period #{index}: {source}")]
    InvalidPeriod {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("csv row {row}: {source}")]
    InvalidCsvRow {
        row: usize,
        #[source]
        source: ValidationError,
    },
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type TransferResult<T> = Result<T, TransferError>;

/// What an import added to the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub schedule_id: String,
    pub name: String,
    pub period_count: usize,
    /// The document's id collided with an existing schedule and was replaced.
    pub id_regenerated: bool,
    /// Number of period fields that were missing or malformed and got defaults.
    pub defaulted_fields: usize,
}

pub fn export_schedule_json(schedule: &Schedule) -> TransferResult<String> {
    serde_json::to_string_pretty(schedule).map_err(TransferError::Serialization)
}

fn sanitize_file_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Download name for an exported schedule: `<sanitised name>-<id>.json`.
pub fn export_file_name(schedule: &Schedule) -> String {
    let mut name = sanitize_file_component(&schedule.name);
    if name.is_empty() {
        name = "schedule".to_string();
    }
    let id = sanitize_file_component(&schedule.id);
    if id.is_empty() {
        format!("{name}.json")
    } else {
        format!("{name}-{id}.json")
    }
}

/// Writes the export document. When `target` is an existing directory the
/// file is placed inside it under [`export_file_name`].
pub fn export_schedule_to_path<P: AsRef<Path>>(
    schedule: &Schedule,
    target: P,
) -> TransferResult<PathBuf> {
    let target = target.as_ref();
    let path = if target.is_dir() {
        target.join(export_file_name(schedule))
    } else {
        target.to_path_buf()
    };
    fs::write(&path, export_schedule_json(schedule)?)?;
    info!(
        "event=schedule_exported id={} path={}",
        schedule.id,
        path.display()
    );
    Ok(path)
}

fn require_str<'a>(object: &'a Map<String, Value>, field: &str) -> TransferResult<&'a str> {
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| TransferError::InvalidShape(format!("`{field}` must be a string")))
}

fn time_or_default(
    object: &Map<String, Value>,
    field: &str,
    default: &str,
    index: usize,
    defaulted: &mut usize,
) -> TimeOfDay {
    let parsed = object
        .get(field)
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<TimeOfDay>().ok());
    match parsed {
        Some(time) => time,
        None => {
            if object.contains_key(field) {
                warn!("event=import_time_defaulted period={index} field={field}");
            }
            *defaulted += 1;
            default.parse().unwrap_or(TimeOfDay::MIDNIGHT)
        }
    }
}

/// Parses and shape-checks an export document without touching any book.
///
/// The top level must carry `id` and `name` strings and a `periods` array.
/// Per-period gaps are filled in: a missing or duplicate id gets a fresh one,
/// a missing name becomes [`PLACEHOLDER_PERIOD_NAME`], and missing or
/// unreadable times become 08:00 and 09:00. Returns the schedule and how many
/// fields were defaulted.
pub fn parse_schedule_document(document: &str) -> TransferResult<(Schedule, usize)> {
    let value: Value = serde_json::from_str(document).map_err(TransferError::InvalidJson)?;
    let object = value
        .as_object()
        .ok_or_else(|| TransferError::InvalidShape("top level must be an object".into()))?;

    let id = match require_str(object, "id")?.trim() {
        "" => new_id(),
        existing => existing.to_string(),
    };
    let name = validation::validate_schedule_name(require_str(object, "name")?)
        .map_err(|err| TransferError::InvalidShape(err.to_string()))?;
    let raw_periods = object
        .get("periods")
        .and_then(Value::as_array)
        .ok_or_else(|| TransferError::InvalidShape("`periods` must be an array".into()))?;

    let mut defaulted = 0;
    let mut seen_ids: HashSet<String> = HashSet::with_capacity(raw_periods.len());
    let mut periods = Vec::with_capacity(raw_periods.len());
    for (index, raw) in raw_periods.iter().enumerate() {
        let period_obj = raw.as_object().ok_or_else(|| {
            TransferError::InvalidShape(format!("period #{index} must be an object"))
        })?;

        let period_id = match period_obj.get("id").and_then(Value::as_str) {
            Some(existing) if !existing.trim().is_empty() && !seen_ids.contains(existing) => {
                existing.to_string()
            }
            _ => {
                defaulted += 1;
                let mut fresh = new_id();
                while seen_ids.contains(fresh.as_str()) {
                    fresh = new_id();
                }
                fresh
            }
        };
        seen_ids.insert(period_id.clone());

        let period_name = match period_obj.get("name").and_then(Value::as_str).map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                defaulted += 1;
                PLACEHOLDER_PERIOD_NAME.to_string()
            }
        };

        let start_time =
            time_or_default(period_obj, "startTime", DEFAULT_START_TIME, index, &mut defaulted);
        let end_time =
            time_or_default(period_obj, "endTime", DEFAULT_END_TIME, index, &mut defaulted);
        validation::validate_time_range(start_time, end_time)
            .map_err(|source| TransferError::InvalidPeriod { index, source })?;

        let agenda = period_obj
            .get("agenda")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        periods.push(Period {
            id: period_id,
            name: period_name,
            start_time,
            end_time,
            agenda,
        });
    }

    Ok((Schedule { id, name, periods }, defaulted))
}

/// Parses `document` and merges it into `book`, selecting the new schedule.
///
/// Nothing in the book changes unless the whole document is accepted. When
/// the document's id is already taken the schedule gets a fresh id and its
/// name is suffixed with [`IMPORTED_NAME_SUFFIX`].
pub fn import_schedule(book: &mut ScheduleBook, document: &str) -> TransferResult<ImportReport> {
    let (mut schedule, defaulted_fields) = parse_schedule_document(document)?;

    let id_regenerated = book.contains(&schedule.id);
    if id_regenerated {
        while book.contains(&schedule.id) {
            schedule.id = new_id();
        }
        schedule.name.push_str(IMPORTED_NAME_SUFFIX);
    }

    let inserted = book.insert_schedule(schedule);
    let report = ImportReport {
        schedule_id: inserted.id.clone(),
        name: inserted.name.clone(),
        period_count: inserted.periods.len(),
        id_regenerated,
        defaulted_fields,
    };
    info!(
        "event=schedule_imported id={} periods={} id_regenerated={} defaulted_fields={}",
        report.schedule_id, report.period_count, report.id_regenerated, report.defaulted_fields
    );
    Ok(report)
}

pub fn read_document<P: AsRef<Path>>(path: P) -> TransferResult<String> {
    Ok(fs::read_to_string(path)?)
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeriodCsvRecord {
    name: String,
    start_time: String,
    end_time: String,
    #[serde(default)]
    agenda: String,
}

impl From<&Period> for PeriodCsvRecord {
    fn from(period: &Period) -> Self {
        Self {
            name: period.name.clone(),
            start_time: period.start_time.to_string(),
            end_time: period.end_time.to_string(),
            agenda: period.agenda.clone().unwrap_or_default(),
        }
    }
}

impl From<PeriodCsvRecord> for PeriodDraft {
    fn from(record: PeriodCsvRecord) -> Self {
        let draft = PeriodDraft::new(record.name, record.start_time, record.end_time);
        if record.agenda.trim().is_empty() {
            draft
        } else {
            draft.with_agenda(record.agenda)
        }
    }
}

/// Writes a schedule's periods in start order as `name,startTime,endTime,agenda`.
pub fn save_periods_to_csv<P: AsRef<Path>>(schedule: &Schedule, path: P) -> TransferResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for period in schedule.sorted_periods() {
        writer.serialize(PeriodCsvRecord::from(period))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_period_drafts_from_csv<P: AsRef<Path>>(path: P) -> TransferResult<Vec<PeriodDraft>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut drafts = Vec::new();
    for record in reader.deserialize::<PeriodCsvRecord>() {
        drafts.push(record?.into());
    }
    Ok(drafts)
}

/// Appends every draft to the selected schedule, or none of them if any row
/// fails validation. Returns the number of periods added.
pub fn import_period_drafts(
    book: &mut ScheduleBook,
    drafts: &[PeriodDraft],
) -> TransferResult<usize> {
    if book.selected().is_none() {
        return Err(ScheduleError::NoScheduleSelected.into());
    }
    for (idx, draft) in drafts.iter().enumerate() {
        validation::validate_period_draft(draft)
            .map_err(|source| TransferError::InvalidCsvRow { row: idx + 1, source })?;
    }
    for draft in drafts {
        book.add_period(draft)?;
    }
    Ok(drafts.len())
}
