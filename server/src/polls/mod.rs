//! Polls
//!
//! Poll authoring, voting and tallies.

mod error;
pub mod handlers;
mod service;
mod types;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::api::AppState;
use crate::auth::optional_auth;

pub use error::{PollError, PollResult};
pub use service::{PollService, VotePolicy};
pub use types::{PollInput, PollResults, VoteRequest};

/// Create the polls router.
///
/// Every route runs behind [`optional_auth`]. Routes that need a signed-in
/// caller reject anonymous requests in the handler or service, after input
/// validation.
///
/// - GET/POST /
/// - GET/PUT/DELETE /{id}
/// - GET /{id}/results
/// - POST /{id}/votes
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_my_polls).post(handlers::create_poll))
        .route(
            "/{id}",
            get(handlers::get_poll)
                .put(handlers::update_poll)
                .delete(handlers::delete_poll),
        )
        .route("/{id}/results", get(handlers::get_results))
        .route("/{id}/votes", post(handlers::submit_vote))
        .layer(from_fn_with_state(state, optional_auth))
}
