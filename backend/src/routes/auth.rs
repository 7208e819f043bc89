//! Registration, login and token validation endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::{password, AuthUser};
use crate::error::{Error, Result};
use crate::models::{Role, User};
use crate::store::NewUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub position: String,
    pub hourly_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub message: String,
}

pub fn public_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .with_state(state)
}

pub fn protected_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/validate", get(validate))
        .with_state(state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    validate_registration(&payload)?;

    let password_hash = password::hash_password(&payload.password)?;
    let user = state.store.create_user(NewUser {
        username: payload.username,
        email: payload.email,
        password_hash,
        first_name: payload.first_name,
        last_name: payload.last_name,
        role: payload.role,
        department: payload.department,
        position: payload.position,
        hourly_rate: payload.hourly_rate,
    })?;

    tracing::info!(username = %user.username, "user registered");
    auth_response(&state, &user, "User registered successfully")
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let bad_credentials = || Error::Unauthorized("Invalid username or password".to_string());

    let user = state
        .store
        .find_user_by_username(&payload.username)?
        .ok_or_else(bad_credentials)?;

    if !password::verify_password(&payload.password, &user.password_hash) {
        return Err(bad_credentials());
    }
    if !user.enabled {
        return Err(Error::Unauthorized("Account is disabled".to_string()));
    }

    tracing::info!(username = %user.username, "login successful");
    auth_response(&state, &user, "Authentication successful")
}

async fn validate(_caller: AuthUser) -> &'static str {
    "Token is valid"
}

fn auth_response(state: &AppState, user: &User, message: &str) -> Result<Json<AuthResponse>> {
    let token = state
        .tokens
        .issue(user)
        .map_err(|e| Error::Internal(format!("Failed to issue token: {}", e)))?;

    Ok(Json(AuthResponse {
        token,
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        role: user.role,
        message: message.to_string(),
    }))
}

fn validate_registration(payload: &RegisterRequest) -> Result<()> {
    if payload.username.len() < 3 || payload.username.len() > 50 {
        return Err(Error::Validation(
            "Username must be between 3 and 50 characters".to_string(),
        ));
    }
    if !payload.email.contains('@') || payload.email.len() > 100 {
        return Err(Error::Validation("Email is not valid".to_string()));
    }
    if payload.password.len() < 8 {
        return Err(Error::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if !payload.hourly_rate.is_finite() || payload.hourly_rate < 0.0 {
        return Err(Error::Validation(
            "Hourly rate must not be negative".to_string(),
        ));
    }
    Ok(())
}
