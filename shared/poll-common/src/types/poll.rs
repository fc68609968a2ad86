//! Poll Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A selectable option of a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PollOption {
    /// Option ID.
    pub id: Uuid,
    /// Poll this option belongs to.
    pub poll_id: Uuid,
    /// Display text.
    pub option_text: String,
    /// Zero-based display order.
    pub position: i32,
}

/// A poll with its ordered options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Poll {
    /// Poll ID.
    pub id: Uuid,
    /// Owner (creator) of the poll.
    pub owner_id: Uuid,
    /// Poll title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// When the poll was created.
    pub created_at: DateTime<Utc>,
    /// When the poll was last updated.
    pub updated_at: DateTime<Utc>,
    /// Options ordered by position.
    pub options: Vec<PollOption>,
}

/// A single recorded vote. Votes are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Vote {
    /// Vote ID.
    pub id: Uuid,
    /// Poll voted on.
    pub poll_id: Uuid,
    /// Chosen option.
    pub option_id: Uuid,
    /// Voter, `None` for anonymous votes.
    pub voter_id: Option<Uuid>,
    /// When the vote was cast.
    pub created_at: DateTime<Utc>,
}

/// Option with its derived vote count and display percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OptionTally {
    pub id: Uuid,
    pub option_text: String,
    pub position: i32,
    pub votes: u64,
    pub percentage: u32,
}

/// Poll assembled with per-option tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TalliedPoll {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub options: Vec<OptionTally>,
    /// Sum of votes over the poll's current options.
    pub total_votes: u64,
}

impl TalliedPoll {
    /// Look up an option tally by its text.
    pub fn option(&self, text: &str) -> Option<&OptionTally> {
        self.options.iter().find(|o| o.option_text == text)
    }
}
