//! In-process storage backend.
//!
//! Keeps everything behind a single lock so each operation is atomic the
//! same way a database transaction would be. Used by tests and by local
//! runs without `PostgreSQL`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poll_common::{Poll, PollDraft, PollOption, Vote};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{NewUser, Session, User};
use super::store::{
    DeleteOutcome, NewVote, PollStore, StoreError, UpdateOutcome, UserStore, VoteOutcome,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    admins: HashSet<Uuid>,
    sessions: HashMap<Uuid, Session>,
    polls: HashMap<Uuid, Poll>,
    votes: Vec<Vote>,
}

/// Store keeping all records in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn build_options(poll_id: Uuid, draft: &PollDraft) -> Vec<PollOption> {
    draft
        .options()
        .iter()
        .zip(0_i32..)
        .map(|(text, position)| PollOption {
            id: Uuid::now_v7(),
            poll_id,
            option_text: text.clone(),
            position,
        })
        .collect()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::Conflict);
        }

        let user = User {
            id: Uuid::now_v7(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };

        if tables.users.is_empty() {
            tables.admins.insert(user.id);
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn is_system_admin(&self, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.admins.contains(&user_id))
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let session = Session {
            id: Uuid::now_v7(),
            user_id,
            created_at: Utc::now(),
            expires_at,
        };
        self.tables
            .write()
            .await
            .sessions
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, session_id: Uuid) -> Result<Option<Session>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .get(&session_id)
            .filter(|s| s.expires_at > Utc::now())
            .cloned())
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .write()
            .await
            .sessions
            .remove(&session_id)
            .is_some())
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn create_poll(&self, owner_id: Uuid, draft: &PollDraft) -> Result<Poll, StoreError> {
        let now = Utc::now();
        let id = Uuid::now_v7();
        let poll = Poll {
            id,
            owner_id,
            title: draft.title().to_owned(),
            description: draft.description().map(str::to_owned),
            created_at: now,
            updated_at: now,
            options: build_options(id, draft),
        };

        self.tables.write().await.polls.insert(id, poll.clone());
        Ok(poll)
    }

    async fn update_poll(
        &self,
        poll_id: Uuid,
        owner_id: Uuid,
        draft: &PollDraft,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut tables = self.tables.write().await;

        let Some(poll) = tables.polls.get_mut(&poll_id) else {
            return Ok(UpdateOutcome::NotFound);
        };
        if poll.owner_id != owner_id {
            return Ok(UpdateOutcome::NotOwner);
        }

        poll.title = draft.title().to_owned();
        poll.description = draft.description().map(str::to_owned);
        poll.updated_at = Utc::now();
        poll.options = build_options(poll_id, draft);
        let updated = poll.clone();

        // Votes go with the options they were cast for
        let live: HashSet<Uuid> = updated.options.iter().map(|o| o.id).collect();
        tables
            .votes
            .retain(|v| v.poll_id != poll_id || live.contains(&v.option_id));

        Ok(UpdateOutcome::Updated(updated))
    }

    async fn delete_poll(
        &self,
        poll_id: Uuid,
        owner_id: Option<Uuid>,
    ) -> Result<DeleteOutcome, StoreError> {
        let mut tables = self.tables.write().await;

        match tables.polls.get(&poll_id) {
            None => return Ok(DeleteOutcome::NotFound),
            Some(poll) if owner_id.is_some_and(|owner| owner != poll.owner_id) => {
                return Ok(DeleteOutcome::NotOwner)
            }
            Some(_) => {}
        }

        tables.polls.remove(&poll_id);
        tables.votes.retain(|v| v.poll_id != poll_id);
        Ok(DeleteOutcome::Deleted)
    }

    async fn get_poll(&self, poll_id: Uuid) -> Result<Option<Poll>, StoreError> {
        Ok(self.tables.read().await.polls.get(&poll_id).cloned())
    }

    async fn list_polls(&self, owner_id: Option<Uuid>) -> Result<Vec<Poll>, StoreError> {
        let tables = self.tables.read().await;
        let mut polls: Vec<Poll> = tables
            .polls
            .values()
            .filter(|p| owner_id.is_none_or(|owner| p.owner_id == owner))
            .cloned()
            .collect();
        // v7 IDs break ties between polls created in the same instant
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(polls)
    }

    async fn list_votes(&self, poll_ids: &[Uuid]) -> Result<Vec<Vote>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .votes
            .iter()
            .filter(|v| poll_ids.contains(&v.poll_id))
            .cloned()
            .collect())
    }

    async fn insert_vote(&self, vote: NewVote) -> Result<VoteOutcome, StoreError> {
        let mut tables = self.tables.write().await;

        let Some(poll) = tables.polls.get(&vote.poll_id) else {
            return Ok(VoteOutcome::PollNotFound);
        };
        if !poll.options.iter().any(|o| o.id == vote.option_id) {
            return Ok(VoteOutcome::OptionNotInPoll);
        }

        if let (true, Some(voter_id)) = (vote.one_per_user, vote.voter_id) {
            let voted = tables
                .votes
                .iter()
                .any(|v| v.poll_id == vote.poll_id && v.voter_id == Some(voter_id));
            if voted {
                return Ok(VoteOutcome::AlreadyVoted);
            }
        }

        let recorded = Vote {
            id: Uuid::now_v7(),
            poll_id: vote.poll_id,
            option_id: vote.option_id,
            voter_id: vote.voter_id,
            created_at: Utc::now(),
        };
        tables.votes.push(recorded.clone());
        Ok(VoteOutcome::Recorded(recorded))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn draft(options: &[&str]) -> PollDraft {
        PollDraft::new("Lunch?", None, options.iter().copied()).unwrap()
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn test_first_user_becomes_admin() {
        let store = MemoryStore::new();
        let first = store.create_user(new_user("a@example.com")).await.unwrap();
        let second = store.create_user(new_user("b@example.com")).await.unwrap();

        assert!(store.is_system_admin(first.id).await.unwrap());
        assert!(!store.is_system_admin(second.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@example.com")).await.unwrap();
        let err = store.create_user(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn test_expired_session_is_not_found() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let expired = store
            .create_session(user_id, Utc::now() - chrono::Duration::seconds(1))
            .await
            .unwrap();
        let live = store
            .create_session(user_id, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        assert!(store.find_session(expired.id).await.unwrap().is_none());
        assert!(store.find_session(live.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_by_non_owner_changes_nothing() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let poll = store.create_poll(owner, &draft(&["A", "B"])).await.unwrap();

        let outcome = store
            .update_poll(poll.id, Uuid::new_v4(), &draft(&["X", "Y"]))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NotOwner);

        let stored = store.get_poll(poll.id).await.unwrap().unwrap();
        assert_eq!(stored, poll);
    }

    #[tokio::test]
    async fn test_update_replaces_options_and_drops_their_votes() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let poll = store.create_poll(owner, &draft(&["A", "B"])).await.unwrap();
        store
            .insert_vote(NewVote {
                poll_id: poll.id,
                option_id: poll.options[0].id,
                voter_id: None,
                one_per_user: false,
            })
            .await
            .unwrap();

        let UpdateOutcome::Updated(updated) = store
            .update_poll(poll.id, owner, &draft(&["C", "D", "E"]))
            .await
            .unwrap()
        else {
            panic!("expected update");
        };

        let texts: Vec<_> = updated.options.iter().map(|o| o.option_text.as_str()).collect();
        assert_eq!(texts, ["C", "D", "E"]);
        assert!(store.list_votes(&[poll.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let poll = store.create_poll(owner, &draft(&["A", "B"])).await.unwrap();

        assert_eq!(
            store.delete_poll(poll.id, Some(Uuid::new_v4())).await.unwrap(),
            DeleteOutcome::NotOwner
        );
        assert_eq!(
            store.delete_poll(poll.id, Some(owner)).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            store.delete_poll(poll.id, None).await.unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_vote_rejects_foreign_option() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let a = store.create_poll(owner, &draft(&["A", "B"])).await.unwrap();
        let b = store.create_poll(owner, &draft(&["C", "D"])).await.unwrap();

        let outcome = store
            .insert_vote(NewVote {
                poll_id: a.id,
                option_id: b.options[0].id,
                voter_id: None,
                one_per_user: false,
            })
            .await
            .unwrap();
        assert_eq!(outcome, VoteOutcome::OptionNotInPoll);
    }

    #[tokio::test]
    async fn test_one_vote_per_user_under_concurrency() {
        let store = Arc::new(MemoryStore::new());
        let poll = store
            .create_poll(Uuid::new_v4(), &draft(&["A", "B"]))
            .await
            .unwrap();
        let voter = Uuid::new_v4();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = Arc::clone(&store);
                let vote = NewVote {
                    poll_id: poll.id,
                    option_id: poll.options[1].id,
                    voter_id: Some(voter),
                    one_per_user: true,
                };
                tokio::spawn(async move { store.insert_vote(vote).await.unwrap() })
            })
            .collect();

        let mut recorded = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), VoteOutcome::Recorded(_)) {
                recorded += 1;
            }
        }
        assert_eq!(recorded, 1);
        assert_eq!(store.list_votes(&[poll.id]).await.unwrap().len(), 1);
    }
}
