//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::warn;

use crate::domain::{RetailServiceId, TimetableUid, Toc};
use crate::gather::{BoardKind, FindStatus};
use crate::timetable::LookupStatus;

use super::dto::*;
use super::state::AppState;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/service/:uid/:date", get(service_by_uid))
        .route("/retail/:id/:date", get(services_by_retail_id))
        .route("/toc/:toc/:date", get(services_by_toc))
        .route("/departures/:station/:at", get(departures))
        .route("/arrivals/:station/:at", get(arrivals))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| AppError::BadRequest {
        message: format!("Invalid date: {value}"),
    })
}

fn lookup_code(status: LookupStatus) -> StatusCode {
    match status {
        LookupStatus::ServiceNotFound => StatusCode::NOT_FOUND,
        LookupStatus::Success | LookupStatus::NoScheduleOnDate => StatusCode::OK,
    }
}

fn board_code(status: FindStatus) -> StatusCode {
    match status {
        FindStatus::Success | FindStatus::NoServicesForLocation => StatusCode::OK,
        FindStatus::LocationNotFound => StatusCode::NOT_FOUND,
        FindStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// One service by timetable UID on a date.
async fn service_by_uid(
    State(state): State<AppState>,
    Path((uid, date)): Path<(String, String)>,
) -> Result<(StatusCode, Json<LookupResponse>), AppError> {
    let uid = TimetableUid::parse(&uid.to_ascii_uppercase()).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    let date = parse_date(&date)?;

    let snapshot = &state.snapshot;
    let (status, service) = snapshot.timetable.get_schedule_by_timetable_uid(&uid, date);
    let services = service
        .iter()
        .map(|s| ServiceResult::from_resolved(s, &snapshot.locations))
        .collect();

    Ok((
        lookup_code(status),
        Json(LookupResponse {
            status: lookup_status(status).to_string(),
            services,
        }),
    ))
}

/// Every service in a retail service group on a date.
async fn services_by_retail_id(
    State(state): State<AppState>,
    Path((id, date)): Path<(String, String)>,
) -> Result<(StatusCode, Json<LookupResponse>), AppError> {
    let id = RetailServiceId::parse(&id.to_ascii_uppercase()).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    let date = parse_date(&date)?;

    let snapshot = &state.snapshot;
    let (status, services) = snapshot.timetable.get_schedule_by_retail_service_id(&id, date);
    Ok(lookup_response(status, &services, &state))
}

/// Every service an operator runs on a date, optionally on an operating
/// day that starts at `boundary`.
async fn services_by_toc(
    State(state): State<AppState>,
    Path((toc, date)): Path<(String, String)>,
    Query(query): Query<TocQuery>,
) -> Result<(StatusCode, Json<LookupResponse>), AppError> {
    let toc = Toc::parse(&toc.to_ascii_uppercase()).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    let date = parse_date(&date)?;
    let boundary = query
        .boundary
        .as_deref()
        .map(|b| {
            NaiveTime::parse_from_str(b, "%H:%M").map_err(|_| AppError::BadRequest {
                message: format!("Invalid boundary: {b}"),
            })
        })
        .transpose()?;

    let (status, services) = state.snapshot.timetable.get_schedules_by_toc(&toc, date, boundary);
    Ok(lookup_response(status, &services, &state))
}

fn lookup_response(
    status: LookupStatus,
    services: &[crate::timetable::ResolvedService],
    state: &AppState,
) -> (StatusCode, Json<LookupResponse>) {
    let services = services
        .iter()
        .map(|s| ServiceResult::from_resolved(s, &state.snapshot.locations))
        .collect();
    (
        lookup_code(status),
        Json(LookupResponse {
            status: lookup_status(status).to_string(),
            services,
        }),
    )
}

async fn departures(
    State(state): State<AppState>,
    Path((station, at)): Path<(String, String)>,
    Query(query): Query<BoardQuery>,
) -> Result<(StatusCode, Json<BoardResponse>), AppError> {
    board(&state, BoardKind::Departures, &station, &at, &query)
}

async fn arrivals(
    State(state): State<AppState>,
    Path((station, at)): Path<(String, String)>,
    Query(query): Query<BoardQuery>,
) -> Result<(StatusCode, Json<BoardResponse>), AppError> {
    board(&state, BoardKind::Arrivals, &station, &at, &query)
}

fn board(
    state: &AppState,
    kind: BoardKind,
    station: &str,
    at: &str,
    query: &BoardQuery,
) -> Result<(StatusCode, Json<BoardResponse>), AppError> {
    let at = NaiveDateTime::parse_from_str(at, DATE_TIME_FORMAT).map_err(|_| AppError::BadRequest {
        message: format!("Invalid time: {at}"),
    })?;
    let config = query.to_config().map_err(|code| AppError::BadRequest {
        message: format!("Invalid operator code: {code}"),
    })?;

    let (status, calls) = state
        .gatherer()
        .gather(kind, &station.to_ascii_uppercase(), at, &config);
    if status == FindStatus::Error {
        warn!(station, %at, "board failed for every candidate service");
    }

    let calls = calls
        .iter()
        .map(|c| BoardCall::from_stop(c, &state.snapshot.locations))
        .collect();
    Ok((
        board_code(status),
        Json(BoardResponse {
            status: find_status(status).to_string(),
            calls,
        }),
    ))
}

/// Application error type.
///
/// Lookups that find nothing are not errors; their status is carried in
/// the response body.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
        };

        warn!(%status, reason = %message, "request rejected");

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
