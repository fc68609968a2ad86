//! Poll request and response types.

use poll_common::{DraftErrors, OptionTally, PollDraft, TalliedPoll};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Body for creating or updating a poll.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PollInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Option texts in display order. Blank entries are ignored.
    #[serde(default)]
    pub options: Vec<String>,
}

impl PollInput {
    /// Validate into a draft.
    pub fn to_draft(&self) -> Result<PollDraft, DraftErrors> {
        PollDraft::new(&self.title, self.description.as_deref(), &self.options)
    }
}

/// Body for casting a vote.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct VoteRequest {
    pub option_id: Uuid,
}

/// Tally of one poll without its metadata.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollResults {
    pub poll_id: Uuid,
    pub total_votes: u64,
    pub options: Vec<OptionTally>,
}

impl From<TalliedPoll> for PollResults {
    fn from(poll: TalliedPoll) -> Self {
        Self {
            poll_id: poll.id,
            total_votes: poll.total_votes,
            options: poll.options,
        }
    }
}
