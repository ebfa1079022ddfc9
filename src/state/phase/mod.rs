//! Per-phase projections and transition logic.

use std::collections::BTreeSet;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::state::{
    content::Embed,
    react::{UserId, mention, stable_hash},
    snapshot::Snapshot,
    transitions::Step,
};

/// Sign-ups.
pub mod idle;
/// Draft.
pub mod picking;
/// Game in progress.
pub mod running;
/// Host and captain election.
pub mod voting;

pub use self::picking::Picking;
pub use self::running::Running;
pub use self::voting::Voting;

/// Assemble an `on_update` batch.
///
/// `resolved` is the updated snapshot with the bot's reactions brought up to
/// date. It always comes first, even when nothing changed, so the outgoing
/// main message is rendered in its final form before any transition and can
/// be reused as history.
fn chain(resolved: Snapshot, then: Vec<Step>) -> Vec<Step> {
    let mut steps = Vec::with_capacity(then.len() + 1);
    steps.push(Step::Advance(resolved));
    steps.extend(then);
    steps
}

/// Space-separated mentions, in id order.
fn mentions<'a>(users: impl IntoIterator<Item = &'a UserId>) -> String {
    users
        .into_iter()
        .map(|user_id| mention(*user_id))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display names of the two teams; index 0 picks first.
pub const TEAM_NAMES: [&str; 2] = ["\u{1F534} Red", "\u{1F535} Blue"];

/// Add host and roster fields for both teams.
fn with_teams(mut embed: Embed, host: Option<UserId>, teams: &[Vec<UserId>; 2]) -> Embed {
    if let Some(host) = host {
        embed = embed.wide_field("Host", mention(host));
    }
    for (name, team) in TEAM_NAMES.iter().zip(teams) {
        embed = embed.field(*name, mentions(team));
    }
    embed
}

/// Shuffle `pool` with a seed derived from the sorted `ids`, then pair each id with an emoji.
///
/// Ids beyond the pool size get no emoji.
fn stable_assignment(
    ids: &BTreeSet<UserId>,
    pool: &[&'static str],
) -> Vec<(UserId, &'static str)> {
    let seed = stable_hash(ids.iter().map(|id| id.to_be_bytes()));
    let mut emojis = pool.to_vec();
    emojis.shuffle(&mut StdRng::seed_from_u64(seed));
    ids.iter().copied().zip(emojis).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_assignment_is_repeatable_and_distinct() {
        let ids = BTreeSet::from([5, 9, 11]);
        let pool = ["a", "b", "c", "d"];
        let first = stable_assignment(&ids, &pool);
        assert_eq!(first, stable_assignment(&ids, &pool));
        let emojis: BTreeSet<_> = first.iter().map(|(_, emoji)| *emoji).collect();
        assert_eq!(emojis.len(), 3);
    }

    #[test]
    fn stable_assignment_truncates_to_pool() {
        let ids = BTreeSet::from([1, 2, 3]);
        assert_eq!(stable_assignment(&ids, &["a", "b"]).len(), 2);
    }
}
