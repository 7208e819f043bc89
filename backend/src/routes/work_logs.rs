//! Work-log endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::models::{MonthlyWorkSummary, WorkLogEntry, WorkLogStatus};
use crate::payroll::OVERTIME_MULTIPLIER;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogRequest {
    pub date: NaiveDate,
    pub hours_worked: f64,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogResponse {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub date: NaiveDate,
    pub hours_worked: f64,
    pub remarks: String,
    pub status: WorkLogStatus,
    /// Pay this single entry would earn at the owner's current rate.
    pub calculated_pay: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/work-logs", get(list).post(create))
        .route("/work-logs/date-range", get(date_range))
        .route("/work-logs/monthly-summary", get(monthly_summary))
        .route("/work-logs/:id", put(update))
        .route("/work-logs/:id/status", put(update_status))
        .with_state(state)
}

async fn list(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<Vec<WorkLogResponse>>> {
    let entries = state.work_logs.list_for_caller(&caller)?;
    to_responses(&state, entries)
}

async fn create(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Json(payload): Json<WorkLogRequest>,
) -> Result<Json<WorkLogResponse>> {
    let entry = state
        .work_logs
        .create(&caller, payload.date, payload.hours_worked, &payload.remarks)?;
    to_response(&state, entry).map(Json)
}

async fn update(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<WorkLogRequest>,
) -> Result<Json<WorkLogResponse>> {
    let entry =
        state
            .work_logs
            .update_content(&caller, id, payload.hours_worked, &payload.remarks)?;
    to_response(&state, entry).map(Json)
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<WorkLogResponse>> {
    let status = WorkLogStatus::parse(&query.status)
        .ok_or_else(|| Error::Validation(format!("Unknown status: {}", query.status)))?;
    let entry = state.work_logs.transition_status(&caller, id, status)?;
    to_response(&state, entry).map(Json)
}

async fn date_range(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Vec<WorkLogResponse>>> {
    let entries =
        state
            .work_logs
            .list_for_caller_between(&caller, range.start_date, range.end_date)?;
    to_responses(&state, entries)
}

async fn monthly_summary(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Vec<MonthlyWorkSummary>>> {
    let summaries = state
        .work_logs
        .monthly_summary(&caller, range.start_date, range.end_date)?;
    Ok(Json(summaries))
}

fn to_responses(
    state: &AppState,
    entries: Vec<WorkLogEntry>,
) -> Result<Json<Vec<WorkLogResponse>>> {
    entries
        .into_iter()
        .map(|entry| to_response(state, entry))
        .collect::<Result<Vec<_>>>()
        .map(Json)
}

fn to_response(state: &AppState, entry: WorkLogEntry) -> Result<WorkLogResponse> {
    let owner = state
        .store
        .find_user_by_id(entry.user_id)?
        .ok_or_else(|| Error::NotFound(format!("User not found with id: {}", entry.user_id)))?;

    let calculated_pay = entry.regular_hours() * owner.hourly_rate
        + entry.overtime_hours() * owner.hourly_rate * OVERTIME_MULTIPLIER;

    Ok(WorkLogResponse {
        id: entry.id,
        user_id: entry.user_id,
        user_name: owner.full_name(),
        date: entry.date,
        hours_worked: entry.hours_worked,
        remarks: entry.remarks,
        status: entry.status,
        calculated_pay: (calculated_pay * 100.0).round() / 100.0,
    })
}
