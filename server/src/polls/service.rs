//! Poll operations.
//!
//! [`PollService`] validates input, enforces ownership and the vote policy,
//! and assembles tallies. Every storage call is bounded by the configured
//! backend timeout.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use poll_common::{tally, Poll, TalliedPoll, Vote};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{
    with_timeout, DeleteOutcome, NewVote, PollStore, StoreError, UpdateOutcome, VoteOutcome,
};

use super::error::{PollError, PollResult};
use super::types::PollInput;

/// Voting rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VotePolicy {
    /// Reject a second vote on a poll from the same signed-in voter.
    pub one_per_user: bool,
    /// Reject anonymous votes.
    pub require_auth: bool,
}

/// Poll aggregator over an injected store.
#[derive(Clone)]
pub struct PollService {
    store: Arc<dyn PollStore>,
    policy: VotePolicy,
    timeout: Duration,
}

impl PollService {
    pub fn new(store: Arc<dyn PollStore>, policy: VotePolicy, timeout: Duration) -> Self {
        Self {
            store,
            policy,
            timeout,
        }
    }

    /// Service using the vote policy and timeout from configuration.
    pub fn from_config(store: Arc<dyn PollStore>, config: &Config) -> Self {
        Self::new(
            store,
            VotePolicy {
                one_per_user: config.vote_one_per_user,
                require_auth: config.vote_require_auth,
            },
            config.backend_timeout(),
        )
    }

    pub const fn policy(&self) -> VotePolicy {
        self.policy
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        with_timeout(self.timeout, call).await
    }

    /// Create a poll owned by `owner`.
    ///
    /// Input is validated before the owner is checked, so a bad form reports
    /// its problem even when signed out.
    #[tracing::instrument(skip(self, input))]
    pub async fn create_poll(
        &self,
        owner: Option<Uuid>,
        input: &PollInput,
    ) -> PollResult<TalliedPoll> {
        let draft = input.to_draft()?;
        let owner = owner.ok_or(PollError::Unauthenticated {
            action: "create a poll",
        })?;

        let poll = self.bounded(self.store.create_poll(owner, &draft)).await?;
        info!(poll_id = %poll.id, options = poll.options.len(), "Poll created");

        Ok(tally(poll, &[]))
    }

    /// Replace title, description and all options of an owned poll.
    #[tracing::instrument(skip(self, input))]
    pub async fn update_poll(
        &self,
        poll_id: Uuid,
        owner: Option<Uuid>,
        input: &PollInput,
    ) -> PollResult<TalliedPoll> {
        let draft = input.to_draft()?;
        let owner = owner.ok_or(PollError::Unauthenticated {
            action: "update a poll",
        })?;

        match self
            .bounded(self.store.update_poll(poll_id, owner, &draft))
            .await?
        {
            UpdateOutcome::Updated(poll) => {
                info!(poll_id = %poll.id, "Poll updated");
                self.with_tally(poll).await
            }
            UpdateOutcome::NotFound => Err(PollError::NotFound),
            UpdateOutcome::NotOwner => Err(PollError::Forbidden),
        }
    }

    /// Delete a poll owned by `owner`.
    #[tracing::instrument(skip(self))]
    pub async fn delete_poll(&self, poll_id: Uuid, owner: Option<Uuid>) -> PollResult<()> {
        let owner = owner.ok_or(PollError::Unauthenticated {
            action: "delete a poll",
        })?;
        self.delete(poll_id, Some(owner)).await
    }

    /// Delete any poll, regardless of owner.
    #[tracing::instrument(skip(self))]
    pub async fn delete_any_poll(&self, poll_id: Uuid) -> PollResult<()> {
        self.delete(poll_id, None).await
    }

    async fn delete(&self, poll_id: Uuid, owner: Option<Uuid>) -> PollResult<()> {
        match self.bounded(self.store.delete_poll(poll_id, owner)).await? {
            DeleteOutcome::Deleted => {
                info!(poll_id = %poll_id, "Poll deleted");
                Ok(())
            }
            DeleteOutcome::NotFound => Err(PollError::NotFound),
            DeleteOutcome::NotOwner => Err(PollError::Forbidden),
        }
    }

    /// Record a vote. `voter` is `None` for anonymous votes.
    #[tracing::instrument(skip(self))]
    pub async fn submit_vote(
        &self,
        poll_id: Uuid,
        option_id: Uuid,
        voter: Option<Uuid>,
    ) -> PollResult<Vote> {
        if self.policy.require_auth && voter.is_none() {
            return Err(PollError::Unauthenticated { action: "vote" });
        }

        let vote = NewVote {
            poll_id,
            option_id,
            voter_id: voter,
            one_per_user: self.policy.one_per_user,
        };

        match self.bounded(self.store.insert_vote(vote)).await? {
            VoteOutcome::Recorded(vote) => Ok(vote),
            VoteOutcome::PollNotFound => Err(PollError::NotFound),
            VoteOutcome::OptionNotInPoll => Err(PollError::OptionNotInPoll),
            VoteOutcome::AlreadyVoted => Err(PollError::AlreadyVoted),
        }
    }

    /// Poll with per-option counts and percentages.
    #[tracing::instrument(skip(self))]
    pub async fn get_poll_with_tally(&self, poll_id: Uuid) -> PollResult<TalliedPoll> {
        let poll = self
            .bounded(self.store.get_poll(poll_id))
            .await?
            .ok_or(PollError::NotFound)?;
        self.with_tally(poll).await
    }

    /// Polls of one owner, newest first, without tallies.
    #[tracing::instrument(skip(self))]
    pub async fn list_polls_for_owner(&self, owner: Uuid) -> PollResult<Vec<Poll>> {
        Ok(self.bounded(self.store.list_polls(Some(owner))).await?)
    }

    /// Every poll, newest first, with tallies.
    #[tracing::instrument(skip(self))]
    pub async fn list_all_polls(&self) -> PollResult<Vec<TalliedPoll>> {
        let polls = self.bounded(self.store.list_polls(None)).await?;
        let ids: Vec<Uuid> = polls.iter().map(|p| p.id).collect();

        let mut votes_by_poll: HashMap<Uuid, Vec<Vote>> = HashMap::new();
        for vote in self.bounded(self.store.list_votes(&ids)).await? {
            votes_by_poll.entry(vote.poll_id).or_default().push(vote);
        }

        Ok(polls
            .into_iter()
            .map(|poll| {
                let votes = votes_by_poll.remove(&poll.id).unwrap_or_default();
                tally(poll, &votes)
            })
            .collect())
    }

    async fn with_tally(&self, poll: Poll) -> PollResult<TalliedPoll> {
        let votes = self.bounded(self.store.list_votes(&[poll.id])).await?;
        Ok(tally(poll, &votes))
    }
}
