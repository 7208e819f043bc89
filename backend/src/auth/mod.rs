pub mod guard;
pub mod middleware;
pub mod password;
pub mod token;

pub use token::{Claims, TokenError, TokenService};

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::Error;
use crate::models::Role;

/// Identity of the authenticated caller, attached to the request by the
/// [`middleware::authenticate`] layer. Passed explicitly to guards and
/// services instead of living in ambient state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| Error::Unauthorized("Full authentication is required".to_string()))
    }
}
