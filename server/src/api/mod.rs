//! API Router and Application State
//!
//! Central routing configuration and shared state.

use std::sync::Arc;

use axum::{extract::State, middleware::from_fn_with_state, routing::get, Json, Router};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

mod extract;

pub use extract::{ApiJson, BodyRejection};

use crate::{
    admin, auth,
    config::Config,
    db::{PollStore, UserStore},
    polls::{self, PollService},
    ratelimit::AttemptLimiter,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Account and session storage
    pub users: Arc<dyn UserStore>,
    /// Poll aggregator
    pub polls: PollService,
    /// Sign-in and sign-up attempt limiter
    pub limiter: AttemptLimiter,
}

impl AppState {
    /// Create new application state.
    ///
    /// `users` and `polls` are usually the same backend.
    #[must_use]
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        polls: Arc<dyn PollStore>,
        limiter: AttemptLimiter,
    ) -> Self {
        let polls = PollService::from_config(polls, &config);
        Self {
            config: Arc::new(config),
            users,
            polls,
            limiter,
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Admin routes (requires auth + system admin)
    // Auth middleware first, then admin router applies require_system_admin internally
    let admin_routes =
        admin::router(state.clone()).layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // API documentation
        .route("/api/openapi.json", get(openapi_json))
        // Auth routes (pass state for middleware)
        .nest("/auth", auth::router(state.clone()))
        // Polls (optional auth; handlers decide)
        .nest("/api/polls", polls::router(state.clone()))
        .nest("/api/admin", admin_routes)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether attempt limiting is enabled
    rate_limiting: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        rate_limiting: state.limiter.config().enabled,
    })
}

/// OpenAPI document for the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    info(title = "Polls API", description = "Create polls, vote and view results"),
    paths(
        auth::handlers::register,
        auth::handlers::login,
        polls::handlers::list_my_polls,
        polls::handlers::create_poll,
        polls::handlers::get_poll,
        polls::handlers::update_poll,
        polls::handlers::delete_poll,
        polls::handlers::get_results,
        polls::handlers::submit_vote,
        admin::handlers::get_admin_status,
        admin::handlers::list_polls,
        admin::handlers::delete_poll,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Accounts and sessions"),
        (name = "polls", description = "Polls, votes and results"),
        (name = "admin", description = "System administration")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` security scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
