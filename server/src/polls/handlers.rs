//! Poll HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use poll_common::{Poll, TalliedPoll, Vote};
use uuid::Uuid;

use crate::api::{ApiJson, AppState};
use crate::auth::{AuthUser, MaybeAuthUser};

use super::error::PollResult;
use super::types::{PollInput, PollResults, VoteRequest};

/// List the caller's own polls, newest first.
///
/// GET /api/polls
#[utoipa::path(
    get,
    path = "/api/polls",
    tag = "polls",
    responses(
        (status = 200, description = "Polls created by the caller", body = Vec<Poll>),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %auth_user.id))]
pub async fn list_my_polls(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> PollResult<Json<Vec<Poll>>> {
    let polls = state.polls.list_polls_for_owner(auth_user.id).await?;
    Ok(Json(polls))
}

/// Create a poll.
///
/// POST /api/polls
#[utoipa::path(
    post,
    path = "/api/polls",
    tag = "polls",
    request_body = PollInput,
    responses(
        (status = 201, description = "Poll created", body = TalliedPoll),
        (status = 400, description = "Invalid poll"),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, caller, body))]
pub async fn create_poll(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    ApiJson(body): ApiJson<PollInput>,
) -> PollResult<(StatusCode, Json<TalliedPoll>)> {
    let poll = state.polls.create_poll(caller.id(), &body).await?;
    Ok((StatusCode::CREATED, Json(poll)))
}

/// Get a poll with its tally.
///
/// GET /api/polls/{id}
#[utoipa::path(
    get,
    path = "/api/polls/{id}",
    tag = "polls",
    params(("id" = Uuid, Path, description = "Poll ID")),
    responses(
        (status = 200, description = "Poll with tally", body = TalliedPoll),
        (status = 404, description = "Poll not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<Uuid>,
) -> PollResult<Json<TalliedPoll>> {
    Ok(Json(state.polls.get_poll_with_tally(poll_id).await?))
}

/// Replace a poll's title, description and options.
///
/// PUT /api/polls/{id}
#[utoipa::path(
    put,
    path = "/api/polls/{id}",
    tag = "polls",
    params(("id" = Uuid, Path, description = "Poll ID")),
    request_body = PollInput,
    responses(
        (status = 200, description = "Poll updated", body = TalliedPoll),
        (status = 400, description = "Invalid poll"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not the poll owner"),
        (status = 404, description = "Poll not found")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, caller, body))]
pub async fn update_poll(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    Path(poll_id): Path<Uuid>,
    ApiJson(body): ApiJson<PollInput>,
) -> PollResult<Json<TalliedPoll>> {
    let poll = state.polls.update_poll(poll_id, caller.id(), &body).await?;
    Ok(Json(poll))
}

/// Delete one of the caller's polls.
///
/// DELETE /api/polls/{id}
#[utoipa::path(
    delete,
    path = "/api/polls/{id}",
    tag = "polls",
    params(("id" = Uuid, Path, description = "Poll ID")),
    responses(
        (status = 204, description = "Poll deleted"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not the poll owner"),
        (status = 404, description = "Poll not found")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, caller))]
pub async fn delete_poll(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    Path(poll_id): Path<Uuid>,
) -> PollResult<StatusCode> {
    state.polls.delete_poll(poll_id, caller.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Tally of a poll.
///
/// GET /api/polls/{id}/results
#[utoipa::path(
    get,
    path = "/api/polls/{id}/results",
    tag = "polls",
    params(("id" = Uuid, Path, description = "Poll ID")),
    responses(
        (status = 200, description = "Per-option counts and percentages", body = PollResults),
        (status = 404, description = "Poll not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_results(
    State(state): State<AppState>,
    Path(poll_id): Path<Uuid>,
) -> PollResult<Json<PollResults>> {
    let tallied = state.polls.get_poll_with_tally(poll_id).await?;
    Ok(Json(tallied.into()))
}

/// Cast a vote.
///
/// POST /api/polls/{id}/votes
#[utoipa::path(
    post,
    path = "/api/polls/{id}/votes",
    tag = "polls",
    params(("id" = Uuid, Path, description = "Poll ID")),
    request_body = VoteRequest,
    responses(
        (status = 201, description = "Vote recorded", body = Vote),
        (status = 400, description = "Option does not belong to the poll"),
        (status = 401, description = "Voting requires sign-in"),
        (status = 404, description = "Poll not found"),
        (status = 409, description = "Already voted")
    )
)]
#[tracing::instrument(skip(state, caller, body))]
pub async fn submit_vote(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    Path(poll_id): Path<Uuid>,
    ApiJson(body): ApiJson<VoteRequest>,
) -> PollResult<(StatusCode, Json<Vote>)> {
    let vote = state
        .polls
        .submit_vote(poll_id, body.option_id, caller.id())
        .await?;
    Ok((StatusCode::CREATED, Json(vote)))
}
