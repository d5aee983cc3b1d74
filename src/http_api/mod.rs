use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::{Local, NaiveTime};
use log::{error, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::command::{Command, CommandError, Outcome};
use crate::period::PeriodDraft;
use crate::planner::{Planner, ScheduleStatus};
use crate::schedule::{Schedule, ScheduleError};
use crate::time_of_day::TimeOfDay;
use crate::transfer::{self, TransferError};

#[derive(Clone)]
pub struct AppState {
    planner: Arc<RwLock<Planner>>,
}

impl AppState {
    pub fn new(planner: Planner) -> Self {
        Self {
            planner: Arc::new(RwLock::new(planner)),
        }
    }

    fn planner(&self) -> Arc<RwLock<Planner>> {
        self.planner.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl From<CommandError> for ApiError {
    fn from(value: CommandError) -> Self {
        let message = value.to_string();
        match value {
            CommandError::Schedule(err) | CommandError::Transfer(TransferError::Schedule(err)) => {
                match err {
                    ScheduleError::PeriodNotFound(_) | ScheduleError::ScheduleNotFound(_) => {
                        ApiError::NotFound(message)
                    }
                    ScheduleError::NoScheduleSelected => ApiError::Conflict(message),
                    ScheduleError::Validation(_) => ApiError::Invalid(message),
                }
            }
            CommandError::Transfer(TransferError::Io(_))
            | CommandError::Transfer(TransferError::Serialization(_)) => {
                ApiError::Internal(message)
            }
            CommandError::Transfer(_) => ApiError::Invalid(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                error!("event=http_internal_error message={message}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ScheduleList {
    selected_id: Option<String>,
    schedules: Vec<Schedule>,
}

#[derive(Debug, Deserialize)]
struct NamePayload {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SelectionPayload {
    schedule_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    /// `HH:MM`; the local wall clock when absent.
    at: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/schedules", get(list_schedules).post(create_schedule))
        .route(
            "/schedules/:id",
            put(rename_schedule).delete(delete_schedule),
        )
        .route("/schedules/:id/periods", post(create_period))
        .route(
            "/schedules/:id/periods/:period_id",
            delete(delete_period),
        )
        .route("/schedules/:id/export", get(export_schedule))
        .route("/selection", put(select_schedule))
        .route("/status", get(status))
        .route("/import", post(import_schedule))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, planner: Planner) -> std::io::Result<()> {
    let app = router(AppState::new(planner));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("event=http_listening addr={addr}");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_schedules(State(state): State<AppState>) -> Json<ScheduleList> {
    let planner = state.planner();
    let guard = planner.read();
    Json(ScheduleList {
        selected_id: guard.book().selected_id().map(str::to_string),
        schedules: guard.book().schedules().to_vec(),
    })
}

async fn create_schedule(
    State(state): State<AppState>,
    Json(payload): Json<NamePayload>,
) -> Result<(StatusCode, Json<Outcome>), ApiError> {
    let outcome = state
        .planner()
        .write()
        .execute(Command::AddSchedule { name: payload.name })?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn rename_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
    Json(payload): Json<NamePayload>,
) -> Result<Json<Outcome>, ApiError> {
    let outcome = state.planner().write().execute(Command::RenameSchedule {
        schedule_id,
        name: payload.name,
    })?;
    Ok(Json(outcome))
}

/// The request itself is the confirmation.
async fn delete_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
) -> Result<Json<Outcome>, ApiError> {
    let outcome = state.planner().write().execute(Command::DeleteSchedule {
        schedule_id,
        confirmed: true,
    })?;
    Ok(Json(outcome))
}

async fn select_schedule(
    State(state): State<AppState>,
    Json(payload): Json<SelectionPayload>,
) -> Result<Json<Outcome>, ApiError> {
    let outcome = state.planner().write().execute(Command::SelectSchedule {
        schedule_id: payload.schedule_id,
    })?;
    Ok(Json(outcome))
}

/// Period routes edit the addressed schedule and never move the selection.
async fn create_period(
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
    Json(draft): Json<PeriodDraft>,
) -> Result<(StatusCode, Json<Outcome>), ApiError> {
    let outcome = state
        .planner()
        .write()
        .execute(Command::AddPeriodTo { schedule_id, draft })?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn delete_period(
    State(state): State<AppState>,
    Path((schedule_id, period_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.planner().write().execute(Command::DeletePeriodFrom {
        schedule_id,
        period_id,
    })?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
) -> Result<Response, ApiError> {
    let planner = state.planner();
    let guard = planner.read();
    let schedule = guard
        .book()
        .find(&schedule_id)
        .ok_or_else(|| ApiError::NotFound(format!("schedule {schedule_id} not found")))?;
    let document = transfer::export_schedule_json(schedule)
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        transfer::export_file_name(schedule)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    )
        .into_response())
}

async fn import_schedule(
    State(state): State<AppState>,
    document: String,
) -> Result<(StatusCode, Json<Outcome>), ApiError> {
    let outcome = state
        .planner()
        .write()
        .execute(Command::ImportSchedule { document })?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ScheduleStatus>, ApiError> {
    let now = match query.at {
        Some(raw) => {
            let time = raw
                .parse::<TimeOfDay>()
                .map_err(|err| ApiError::Invalid(err.to_string()))?;
            NaiveTime::from_num_seconds_from_midnight_opt(time.seconds_since_midnight(), 0)
                .ok_or_else(|| ApiError::Invalid(format!("invalid time '{raw}'")))?
        }
        None => Local::now().time(),
    };
    let planner = state.planner();
    let status = planner.read().status(now);
    Ok(Json(status))
}
