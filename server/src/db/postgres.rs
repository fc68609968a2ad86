//! `PostgreSQL` storage backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poll_common::{Poll, PollDraft, PollOption, Vote};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::models::{NewUser, PollRow, Session, User};
use super::queries::{self, LOCK_SEED_REGISTRATION, LOCK_SEED_VOTE};
use super::store::{
    DeleteOutcome, NewVote, PollStore, StoreError, UpdateOutcome, UserStore, VoteOutcome,
};

/// `PostgreSQL` SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// `PostgreSQL` SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn has_code(err: &sqlx::Error, code: &str) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|c| c == code)
}

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Attach options to poll rows, keeping the row order.
    async fn hydrate(&self, rows: Vec<PollRow>) -> Result<Vec<Poll>, StoreError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut options: HashMap<Uuid, Vec<PollOption>> = HashMap::new();
        for row in queries::list_options(&self.pool, &ids).await? {
            options.entry(row.poll_id).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let opts = options.remove(&row.id).unwrap_or_default();
                row.into_poll(opts)
            })
            .collect())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;

        queries::advisory_xact_lock(&mut tx, LOCK_SEED_REGISTRATION, "user_create").await?;
        let existing = queries::count_users(&mut tx).await?;

        let user = match queries::insert_user(&mut tx, &new_user).await {
            Ok(user) => user,
            Err(e) if has_code(&e, UNIQUE_VIOLATION) => return Err(StoreError::Conflict),
            Err(e) => {
                error!(query = "insert_user", error = %e, "Database query failed");
                return Err(e.into());
            }
        };

        if existing == 0 {
            queries::insert_system_admin(&mut tx, user.id).await?;
            tracing::info!(user_id = %user.id, "First user granted system admin");
        }

        tx.commit().await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(queries::find_user_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(queries::find_user_by_id(&self.pool, id).await?)
    }

    async fn is_system_admin(&self, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(queries::is_system_admin(&self.pool, user_id).await?)
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        Ok(queries::create_session(&self.pool, user_id, expires_at).await?)
    }

    async fn find_session(&self, session_id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(queries::find_session(&self.pool, session_id).await?)
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<bool, StoreError> {
        Ok(queries::delete_session(&self.pool, session_id).await?)
    }
}

#[async_trait]
impl PollStore for PgStore {
    async fn create_poll(&self, owner_id: Uuid, draft: &PollDraft) -> Result<Poll, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = queries::insert_poll(&mut tx, owner_id, draft.title(), draft.description())
            .await?;
        let options = queries::insert_options(&mut tx, row.id, draft.options()).await?;

        tx.commit().await?;
        Ok(row.into_poll(options.into_iter().map(Into::into).collect()))
    }

    async fn update_poll(
        &self,
        poll_id: Uuid,
        owner_id: Uuid,
        draft: &PollDraft,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        match queries::lock_poll_owner(&mut tx, poll_id).await? {
            None => return Ok(UpdateOutcome::NotFound),
            Some(owner) if owner != owner_id => return Ok(UpdateOutcome::NotOwner),
            Some(_) => {}
        }

        let Some(row) = queries::update_poll_row(
            &mut tx,
            poll_id,
            owner_id,
            draft.title(),
            draft.description(),
        )
        .await?
        else {
            return Ok(UpdateOutcome::NotFound);
        };

        queries::delete_options(&mut tx, poll_id).await?;
        let options = queries::insert_options(&mut tx, poll_id, draft.options()).await?;

        tx.commit().await?;
        Ok(UpdateOutcome::Updated(
            row.into_poll(options.into_iter().map(Into::into).collect()),
        ))
    }

    async fn delete_poll(
        &self,
        poll_id: Uuid,
        owner_id: Option<Uuid>,
    ) -> Result<DeleteOutcome, StoreError> {
        if queries::delete_poll(&self.pool, poll_id, owner_id).await? > 0 {
            return Ok(DeleteOutcome::Deleted);
        }

        if owner_id.is_some() && queries::poll_exists(&self.pool, poll_id).await? {
            Ok(DeleteOutcome::NotOwner)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }

    async fn get_poll(&self, poll_id: Uuid) -> Result<Option<Poll>, StoreError> {
        let Some(row) = queries::find_poll(&self.pool, poll_id).await? else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![row]).await?.pop())
    }

    async fn list_polls(&self, owner_id: Option<Uuid>) -> Result<Vec<Poll>, StoreError> {
        let rows = queries::list_polls(&self.pool, owner_id).await?;
        self.hydrate(rows).await
    }

    async fn list_votes(&self, poll_ids: &[Uuid]) -> Result<Vec<Vote>, StoreError> {
        Ok(queries::list_votes(&self.pool, poll_ids)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn insert_vote(&self, vote: NewVote) -> Result<VoteOutcome, StoreError> {
        if !queries::poll_exists(&self.pool, vote.poll_id).await? {
            return Ok(VoteOutcome::PollNotFound);
        }

        let mut tx = self.pool.begin().await?;

        if !queries::option_in_poll(&mut tx, vote.poll_id, vote.option_id).await? {
            return Ok(VoteOutcome::OptionNotInPoll);
        }

        if let (true, Some(voter_id)) = (vote.one_per_user, vote.voter_id) {
            let key = format!("{}:{}", vote.poll_id, voter_id);
            queries::advisory_xact_lock(&mut tx, LOCK_SEED_VOTE, &key).await?;
            if queries::has_voted(&mut tx, vote.poll_id, voter_id).await? {
                return Ok(VoteOutcome::AlreadyVoted);
            }
        }

        let row = match queries::insert_vote(&mut tx, vote.poll_id, vote.option_id, vote.voter_id)
            .await
        {
            Ok(row) => row,
            // Option removed by a concurrent update between the check and the insert
            Err(e) if has_code(&e, FOREIGN_KEY_VIOLATION) => {
                return Ok(VoteOutcome::OptionNotInPoll)
            }
            Err(e) => {
                error!(query = "insert_vote", poll_id = %vote.poll_id, error = %e, "Database query failed");
                return Err(e.into());
            }
        };

        tx.commit().await?;
        Ok(VoteOutcome::Recorded(row.into()))
    }
}
