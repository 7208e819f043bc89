//! Payroll endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::auth::{guard, AuthUser};
use crate::error::Result;
use crate::models::{PayrollRecord, PayrollSummary, Role};
use crate::payroll::Period;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodQuery {
    pub year_month: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_month: String,
    pub end_month: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/payroll/calculate/:user_id", get(calculate))
        .route("/payroll/my-payroll", get(my_payroll))
        .route("/payroll/report", get(report))
        .route("/payroll/summary", get(summary))
        .with_state(state)
}

async fn calculate(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(user_id): Path<i64>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PayrollRecord>> {
    let period: Period = query.year_month.parse()?;
    let record = state.payroll.calculate_for_user(&caller, user_id, period)?;
    Ok(Json(record))
}

async fn my_payroll(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PayrollRecord>> {
    let period: Period = query.year_month.parse()?;
    let record = state.payroll.calculate_for_user(&caller, caller.id, period)?;
    Ok(Json(record))
}

async fn report(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<PayrollRecord>>> {
    // Role check at the boundary so non-admins get a plain 403; the engine
    // re-checks internally.
    guard::require_role(&caller, Role::Admin)?;
    let period: Period = query.year_month.parse()?;
    let report = state.payroll.generate_report(&caller, period)?;
    Ok(Json(report))
}

async fn summary(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Query(query): Query<RangeQuery>,
) -> Result<Json<PayrollSummary>> {
    guard::require_role(&caller, Role::Admin)?;
    let start: Period = query.start_month.parse()?;
    let end: Period = query.end_month.parse()?;
    let summary = state.payroll.summarize(&caller, start, end)?;
    Ok(Json(summary))
}
