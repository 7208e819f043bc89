//! Bearer-token authentication middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::AuthUser;
use crate::AppState;

/// Decode the bearer token and attach the caller's identity to the request.
///
/// This middleware never rejects: a missing, invalid or expired token, or a
/// token for a deleted/disabled user, simply leaves the request without an
/// identity. Downstream handlers reject uniformly through the [`AuthUser`]
/// extractor, so a broken token can't crash the pipeline.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    if let Some(token) = token {
        match state.tokens.verify(token) {
            Ok(claims) => match state.store.find_user_by_id(claims.user_id) {
                Ok(Some(user)) if user.enabled && user.username == claims.sub => {
                    req.extensions_mut().insert(AuthUser {
                        id: user.id,
                        username: user.username,
                        role: user.role,
                    });
                }
                Ok(_) => {
                    tracing::debug!(sub = %claims.sub, "token subject unknown or disabled");
                }
                Err(e) => {
                    tracing::error!(error = %e, "user lookup failed during authentication");
                }
            },
            Err(e) => {
                tracing::debug!(error = %e, "token rejected");
            }
        }
    }

    next.run(req).await
}
