pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod payroll;
pub mod routes;
pub mod store;
pub mod test_util;
pub mod worklog;

pub use auth::{AuthUser, TokenService};
pub use config::Config;
pub use error::{Error, Result};
pub use payroll::{DeductionPolicy, FlatRateDeductions, PayrollEngine, Period};
pub use store::Store;
pub use worklog::WorkLogService;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub tokens: TokenService,
    pub store: Arc<Store>,
    pub work_logs: WorkLogService,
    pub payroll: PayrollEngine,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(Store::open(&config.database.url)?);
        let tokens = TokenService::new(&config.jwt.secret, config.jwt.ttl_secs);
        let work_logs = WorkLogService::new(store.clone());
        let payroll = PayrollEngine::new(store.clone());

        Ok(Self {
            config,
            tokens,
            store,
            work_logs,
            payroll,
        })
    }
}

/// Assemble the full application router. Everything except the health check
/// and the register/login endpoints sits behind the authentication layer.
pub fn app(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .merge(routes::auth::protected_router(state.clone()))
        .merge(routes::users::router(state.clone()))
        .merge(routes::work_logs::router(state.clone()))
        .merge(routes::payroll::router(state.clone()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::authenticate,
        ));

    let cors = cors_layer(&state.config.cors.origins);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::public_router(state))
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// "*" allows any origin; anything else is a comma-separated allow list.
fn cors_layer(origins: &str) -> CorsLayer {
    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .split(',')
                .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
