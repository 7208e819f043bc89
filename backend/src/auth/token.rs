//! Stateless JWT issuing and verification.
//!
//! Tokens are HS256-signed with a process-wide secret from config. Validity
//! is purely a function of signature and expiration, re-derived on every
//! request; nothing is persisted.

use std::collections::HashMap;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, User};

/// Decoded token payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    pub role: Role,
    pub user_id: i64,
    /// Issued-at, seconds since epoch.
    pub iat: u64,
    /// Expiration, seconds since epoch.
    pub exp: u64,
    /// Random nonce. Two tokens issued for the same user in the same second
    /// still differ.
    pub jti: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Claim names always taken from the user, never from the extra map. A
/// colliding extra key would serialize as a duplicate JSON field and the
/// token would no longer decode.
const RESERVED_CLAIMS: [&str; 6] = ["sub", "role", "user_id", "iat", "exp", "jti"];

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    Invalid,
    #[error("token is malformed")]
    Malformed,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        TokenService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Issue a token for `user` with the standard claim set.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_with_claims(user, HashMap::new())
    }

    /// Issue a token with extra claims merged into the payload. The
    /// reserved fields (sub, role, user_id, iat, exp, jti) come from `user`;
    /// colliding keys in `extra` are dropped.
    pub fn issue_with_claims(
        &self,
        user: &User,
        mut extra: HashMap<String, serde_json::Value>,
    ) -> Result<String, TokenError> {
        extra.retain(|key, _| !RESERVED_CLAIMS.contains(&key.as_str()));
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: user.username.clone(),
            role: user.role,
            user_id: user.id,
            iat: now,
            exp: now + self.ttl_secs,
            jti: Uuid::new_v4().to_string(),
            extra,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Malformed)
    }

    /// Verify signature and expiration, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::Base64(_)
                | jsonwebtoken::errors::ErrorKind::Json(_)
                | jsonwebtoken::errors::ErrorKind::Utf8(_) => TokenError::Malformed,
                _ => TokenError::Invalid,
            })
    }

    /// True iff the token verifies and its subject is `user`'s username.
    pub fn subject_matches(&self, token: &str, user: &User) -> bool {
        match self.verify(token) {
            Ok(claims) => claims.sub == user.username,
            Err(_) => false,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}
