//! Storage traits.
//!
//! Handlers never talk to a database client directly: they receive a
//! [`UserStore`] and a [`PollStore`] through application state. The
//! `PostgreSQL` implementation lives in [`super::postgres`], the in-process
//! one in [`super::memory`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poll_common::{Poll, PollDraft, Vote};
use thiserror::Error;
use uuid::Uuid;

use super::models::{NewUser, Session, User};

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint hit (e.g. email already registered).
    #[error("Record already exists")]
    Conflict,

    /// The storage call did not finish within the configured bound.
    #[error("Storage call timed out after {0:?}")]
    Timeout(Duration),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of an owner-scoped poll update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Poll updated; options replaced.
    Updated(Poll),
    /// No poll with that ID.
    NotFound,
    /// Poll exists but belongs to someone else. Nothing was changed.
    NotOwner,
}

/// Result of a poll deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    NotOwner,
}

/// Vote to be recorded.
#[derive(Debug, Clone, Copy)]
pub struct NewVote {
    pub poll_id: Uuid,
    pub option_id: Uuid,
    /// `None` for anonymous votes.
    pub voter_id: Option<Uuid>,
    /// Reject the vote if this voter already voted on the poll.
    pub one_per_user: bool,
}

/// Result of recording a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Recorded(Vote),
    PollNotFound,
    /// The option does not belong to the poll.
    OptionNotInPoll,
    /// The voter already voted and the one-vote policy is on.
    AlreadyVoted,
}

/// Account and session storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user. The first user ever created is granted system admin in
    /// the same atomic step. Duplicate emails yield [`StoreError::Conflict`].
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn is_system_admin(&self, user_id: Uuid) -> Result<bool, StoreError>;

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StoreError>;

    /// Find a session that has not expired yet.
    async fn find_session(&self, session_id: Uuid) -> Result<Option<Session>, StoreError>;

    /// Returns `true` if a session was removed.
    async fn delete_session(&self, session_id: Uuid) -> Result<bool, StoreError>;
}

/// Poll, option and vote storage.
#[async_trait]
pub trait PollStore: Send + Sync {
    /// Persist a poll and its options atomically.
    async fn create_poll(&self, owner_id: Uuid, draft: &PollDraft) -> Result<Poll, StoreError>;

    /// Replace title, description and the full option set of a poll owned
    /// by `owner_id`, atomically.
    async fn update_poll(
        &self,
        poll_id: Uuid,
        owner_id: Uuid,
        draft: &PollDraft,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Delete a poll. With `owner_id` set the delete is scoped to that owner.
    async fn delete_poll(
        &self,
        poll_id: Uuid,
        owner_id: Option<Uuid>,
    ) -> Result<DeleteOutcome, StoreError>;

    /// Fetch a poll with its ordered options.
    async fn get_poll(&self, poll_id: Uuid) -> Result<Option<Poll>, StoreError>;

    /// List polls newest first, optionally only those of one owner.
    async fn list_polls(&self, owner_id: Option<Uuid>) -> Result<Vec<Poll>, StoreError>;

    /// All votes recorded for the given polls.
    async fn list_votes(&self, poll_ids: &[Uuid]) -> Result<Vec<Vote>, StoreError>;

    async fn insert_vote(&self, vote: NewVote) -> Result<VoteOutcome, StoreError>;
}

/// Bound a storage call by `limit`.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}
