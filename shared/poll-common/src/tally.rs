//! Vote tallying.
//!
//! Counts are derived from the raw vote rows of a poll and attached to the
//! poll's options. Percentages are rounded independently (half up), so the
//! displayed values may not add up to exactly 100.

use std::collections::HashMap;

use uuid::Uuid;

use crate::types::{OptionTally, Poll, TalliedPoll, Vote};

/// Share of `count` in `total` as a whole percentage, rounded half up.
///
/// Returns 0 when there are no votes at all.
pub const fn percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    // round(100 * count / total) with exact integer half-up rounding
    ((count * 200 + total) / (total * 2)) as u32
}

/// Count votes per option ID.
pub fn count_votes<'a, I>(votes: I) -> HashMap<Uuid, u64>
where
    I: IntoIterator<Item = &'a Vote>,
{
    let mut counts = HashMap::new();
    for vote in votes {
        *counts.entry(vote.option_id).or_insert(0) += 1;
    }
    counts
}

/// Attach vote counts and percentages to every option of `poll`.
///
/// Votes for options that no longer exist on the poll (replaced by an
/// update) are ignored and do not contribute to the total.
pub fn tally(poll: Poll, votes: &[Vote]) -> TalliedPoll {
    let counts = count_votes(votes.iter().filter(|v| v.poll_id == poll.id));

    let total_votes: u64 = poll
        .options
        .iter()
        .map(|o| counts.get(&o.id).copied().unwrap_or(0))
        .sum();

    let options = poll
        .options
        .into_iter()
        .map(|o| {
            let votes = counts.get(&o.id).copied().unwrap_or(0);
            OptionTally {
                id: o.id,
                option_text: o.option_text,
                position: o.position,
                votes,
                percentage: percentage(votes, total_votes),
            }
        })
        .collect();

    TalliedPoll {
        id: poll.id,
        owner_id: poll.owner_id,
        title: poll.title,
        description: poll.description,
        created_at: poll.created_at,
        updated_at: poll.updated_at,
        options,
        total_votes,
    }
}
