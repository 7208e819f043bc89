//! Fixtures shared by the unit and integration tests.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::AuthUser;
use crate::config::{Config, CorsConfig, DatabaseConfig, JwtConfig, LoggingConfig, ServerConfig};
use crate::models::{Role, User};
use crate::store::NewUser;
use crate::AppState;

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        jwt: JwtConfig {
            secret: "test-secret-0123456789-0123456789".to_string(),
            ttl_secs: 3600,
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        cors: CorsConfig {
            origins: "*".to_string(),
        },
    }
}

pub fn create_test_state() -> Arc<AppState> {
    Arc::new(AppState::new(test_config()).expect("test state"))
}

/// A user that was never persisted. `full_name()` is always "Test User".
pub fn user_fixture(id: i64, username: &str, role: Role, hourly_rate: f64) -> User {
    let now = Utc::now();
    User {
        id,
        username: username.to_string(),
        email: format!("{}@ems.com", username),
        password_hash: "unusable-hash".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        role,
        department: "Engineering".to_string(),
        position: "Engineer".to_string(),
        hourly_rate,
        enabled: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn new_user_fixture(username: &str, email: &str, role: Role) -> NewUser {
    new_user_fixture_with_rate(username, email, role, 25.0)
}

pub fn new_user_fixture_with_rate(
    username: &str,
    email: &str,
    role: Role,
    hourly_rate: f64,
) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: "unusable-hash".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        role,
        department: "Engineering".to_string(),
        position: "Engineer".to_string(),
        hourly_rate,
    }
}

pub fn auth_user(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        username: user.username.clone(),
        role: user.role,
    }
}
