use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::auth::SessionIssuer;
use crate::config::Config;
use crate::services::{AuthService, MemberService};
use crate::state::SharedState;

pub mod auth;
mod error;
pub mod members;
mod observability;
pub mod profile;
pub mod session;
mod types;
mod validation;

pub use error::ApiError;
pub use session::SessionContext;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionIssuer {
        &self.shared.sessions
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn member_service(&self) -> &Arc<dyn MemberService> {
        &self.shared.member_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.server.session_inactivity_minutes,
        )));

    let cors_origins = &config.server.cors_allowed_origins;
    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
    };

    let site = ServeDir::new(&config.general.site_path);

    Router::new()
        .nest("/api", api_router(state.clone()))
        .fallback_service(site)
        .layer(middleware::from_fn(session::route_gate_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_context_middleware,
        ))
        .layer(session_layer)
        .layer(cors_layer.allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
        ]).allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}

fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(observability::health))
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/signout", post(auth::sign_out))
        .route("/auth/session", get(auth::current_session))
        .route("/auth/check-user", post(auth::check_user))
        .route(
            "/user/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/user/password", axum::routing::put(profile::change_password))
        .route("/admin/members", get(members::list_members))
        .route(
            "/admin/members/{id}/member-type",
            patch(members::change_member_type),
        )
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
}
