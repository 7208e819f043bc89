//! User management endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{guard, AuthUser};
use crate::error::{Error, Result};
use crate::models::{User, UserProfile};
use crate::models::Role;
use crate::store::UserUpdate;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub position: String,
    pub hourly_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", get(list))
        .route("/users/profile", get(profile))
        .route("/users/check-username", get(check_username))
        .route("/users/check-email", get(check_email))
        .route("/users/:id", get(get_by_id).put(update).delete(remove))
        .route("/users/:id/status", patch(update_status))
        .with_state(state)
}

async fn list(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<Vec<UserProfile>>> {
    guard::require_role(&caller, Role::Admin)?;
    let users = state.store.list_users()?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

async fn profile(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<UserProfile>> {
    let user = find_user(&state, caller.id)?;
    Ok(Json(UserProfile::from(&user)))
}

async fn get_by_id(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<UserProfile>> {
    guard::require_owner_or_admin(&caller, id)?;
    let user = find_user(&state, id)?;
    Ok(Json(UserProfile::from(&user)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>> {
    guard::require_owner_or_admin(&caller, id)?;
    if !payload.hourly_rate.is_finite() || payload.hourly_rate < 0.0 {
        return Err(Error::Validation(
            "Hourly rate must not be negative".to_string(),
        ));
    }

    // The rate drives payroll, so owners cannot raise their own.
    let current = find_user(&state, id)?;
    if payload.hourly_rate != current.hourly_rate {
        guard::require_role(&caller, Role::Admin).map_err(|_| {
            Error::Forbidden("Only administrators can change the hourly rate".to_string())
        })?;
    }

    let user = state.store.update_user(
        id,
        &UserUpdate {
            first_name: payload.first_name,
            last_name: payload.last_name,
            department: payload.department,
            position: payload.position,
            hourly_rate: payload.hourly_rate,
        },
    )?;
    Ok(Json(UserProfile::from(&user)))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<UserProfile>> {
    guard::require_role(&caller, Role::Admin)?;
    let target = find_user(&state, id)?;

    // Disabling the last enabled admin would lock everyone out.
    if !payload.enabled {
        guard::guard_last_admin(&target, &state.store.list_users()?)?;
    }

    let user = state.store.set_user_enabled(id, payload.enabled)?;
    tracing::info!(id, enabled = payload.enabled, "user status updated");
    Ok(Json(UserProfile::from(&user)))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    guard::require_role(&caller, Role::Admin)?;
    let target = find_user(&state, id)?;
    guard::guard_last_admin(&target, &state.store.list_users()?)?;

    state.store.delete_user(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn check_username(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<serde_json::Value>> {
    let exists = state.store.exists_by_username(&query.username)?;
    Ok(Json(json!({ "exists": exists })))
}

async fn check_email(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Query(query): Query<EmailQuery>,
) -> Result<Json<serde_json::Value>> {
    let exists = state.store.exists_by_email(&query.email)?;
    Ok(Json(json!({ "exists": exists })))
}

fn find_user(state: &AppState, id: i64) -> Result<User> {
    state
        .store
        .find_user_by_id(id)?
        .ok_or_else(|| Error::NotFound(format!("User not found with id: {}", id)))
}
