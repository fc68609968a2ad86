//! Database Models

use chrono::{DateTime, Utc};
use poll_common::{Poll, PollOption, Vote};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name (already sanitized).
    pub name: String,
    /// Normalized email address.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Session model. An access token is only valid while its session exists.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (carried in the token as `sid`).
    pub id: Uuid,
    /// User this session belongs to.
    pub user_id: Uuid,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

/// Row of the `polls` table.
#[derive(Debug, Clone, FromRow)]
pub struct PollRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PollRow {
    /// Attach options, keeping them in display order.
    pub fn into_poll(self, mut options: Vec<PollOption>) -> Poll {
        options.sort_by_key(|o| o.position);
        Poll {
            id: self.id,
            owner_id: self.user_id,
            title: self.title,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
            options,
        }
    }
}

/// Row of the `poll_options` table.
#[derive(Debug, Clone, FromRow)]
pub struct PollOptionRow {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_text: String,
    pub position: i32,
}

impl From<PollOptionRow> for PollOption {
    fn from(row: PollOptionRow) -> Self {
        Self {
            id: row.id,
            poll_id: row.poll_id,
            option_text: row.option_text,
            position: row.position,
        }
    }
}

/// Row of the `votes` table.
#[derive(Debug, Clone, FromRow)]
pub struct VoteRow {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_id: Uuid,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<VoteRow> for Vote {
    fn from(row: VoteRow) -> Self {
        Self {
            id: row.id,
            poll_id: row.poll_id,
            option_id: row.option_id,
            voter_id: row.user_id,
            created_at: row.created_at,
        }
    }
}
