//! Election of the host and the two captains.

use std::collections::{BTreeMap, BTreeSet};

use crate::state::{
    content::{DesiredMessages, Embed, MessageContent, MessageKey, history_messages},
    react::{SKIP_EMOJI, UserId, mention},
    snapshot::{Phase, Snapshot},
    transitions::Step,
};

use super::{Picking, chain, idle::Roster, mentions, stable_assignment};

const COLOUR: u32 = 0x42a7f5;

/// Emoji voters use to pick a host.
pub const HOST_POOL: &[&str] = &[
    "🍎", "🍐", "🍊", "🍋", "🍌", "🍉", "🍇", "🍓", "🍒", "🍑", "🥭", "🍍", "🥥", "🥝",
];

/// Emoji voters use to pick captains. Disjoint from [`HOST_POOL`].
pub const CAPT_POOL: &[&str] = &[
    "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼", "🐨", "🐯", "🦁", "🐮", "🐷", "🐸", "🐵",
    "🐔", "🐧", "🐦", "🐤", "🦆",
];

/// Who signed up for what when sign-ups closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voting {
    /// Host volunteers.
    pub hosts: BTreeSet<UserId>,
    /// Captain volunteers.
    pub captains: BTreeSet<UserId>,
    /// Everyone playing, captains included.
    pub players: BTreeSet<UserId>,
}

/// One candidate on a ballot together with the votes they received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    /// Candidate being voted for.
    pub user_id: UserId,
    /// Emoji that counts as a vote for the candidate.
    pub emoji: &'static str,
    /// Distinct users voting for the candidate.
    pub votes: usize,
}

impl Voting {
    /// Snapshot the sign-ups of an idle roster.
    pub fn new(roster: &Roster) -> Self {
        Self {
            hosts: roster.hosts.clone(),
            captains: roster.captains.clone(),
            players: roster.players.clone(),
        }
    }

    /// Everyone eligible to captain. Falls back to all players when fewer
    /// than two people volunteered.
    pub fn captain_candidates(&self) -> BTreeSet<UserId> {
        if self.captains.len() >= 2 {
            self.captains.clone()
        } else {
            self.captains.union(&self.players).copied().collect()
        }
    }

    /// Emoji assignment for the host vote; empty unless there's a choice to make.
    pub fn host_ballot(&self) -> Vec<(UserId, &'static str)> {
        if self.hosts.len() > 1 {
            stable_assignment(&self.hosts, HOST_POOL)
        } else {
            Vec::new()
        }
    }

    /// Emoji assignment for the captain vote; empty unless there's a choice to make.
    pub fn captain_ballot(&self) -> Vec<(UserId, &'static str)> {
        let candidates = self.captain_candidates();
        if candidates.len() > 2 {
            stable_assignment(&candidates, CAPT_POOL)
        } else {
            Vec::new()
        }
    }

    /// Every emoji the bot offers as a ballot option.
    pub fn ballot_emojis(&self) -> Vec<&'static str> {
        self.host_ballot()
            .into_iter()
            .chain(self.captain_ballot())
            .map(|(_, emoji)| emoji)
            .collect()
    }
}

/// Votes per candidate, sorted by votes descending then by candidate id.
fn tally(snapshot: &Snapshot, ballot: &[(UserId, &'static str)]) -> Vec<Tally> {
    let mut voters: BTreeMap<&str, BTreeSet<UserId>> = BTreeMap::new();
    for react in snapshot.user_reacts() {
        voters.entry(react.emoji.as_str()).or_default().insert(react.user_id);
    }
    let mut tallies: Vec<Tally> = ballot
        .iter()
        .map(|(user_id, emoji)| Tally {
            user_id: *user_id,
            emoji: *emoji,
            votes: voters.get(emoji).map_or(0, BTreeSet::len),
        })
        .collect();
    tallies.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.user_id.cmp(&b.user_id)));
    tallies
}

/// Distinct users who voted for anyone on `ballot`.
fn ballots_cast(snapshot: &Snapshot, ballot: &[(UserId, &'static str)]) -> usize {
    snapshot
        .user_reacts()
        .filter(|react| ballot.iter().any(|(_, emoji)| react.emoji == *emoji))
        .map(|react| react.user_id)
        .collect::<BTreeSet<_>>()
        .len()
}

pub(crate) fn on_update(snapshot: &Snapshot, voting: &Voting) -> Vec<Step> {
    let resolved = snapshot.with_bot_reacts(voting.ballot_emojis());
    let host_ballot = voting.host_ballot();
    let captain_ballot = voting.captain_ballot();
    let min_votes = resolved.settings.min_votes;

    let skipped = !resolved.admins_reacting(SKIP_EMOJI).is_empty();
    let decided = |ballot: &[(UserId, &'static str)]| {
        ballot.is_empty() || ballots_cast(&resolved, ballot) >= min_votes
    };
    if !skipped && !(decided(&host_ballot) && decided(&captain_ballot)) {
        return chain(resolved, Vec::new());
    }

    let candidates = voting.captain_candidates();
    if candidates.len() < 2 {
        let cancelled = resolved.enter(
            Phase::Stopped,
            Some("PUG cancelled: not enough captains.".into()),
        );
        return chain(resolved, vec![Step::Advance(cancelled)]);
    }

    let host = if host_ballot.is_empty() {
        voting.hosts.first().copied()
    } else {
        tally(&resolved, &host_ballot).first().map(|tally| tally.user_id)
    };
    let captains = if captain_ballot.is_empty() {
        let mut ids = candidates.iter().copied();
        match (ids.next(), ids.next()) {
            (Some(first), Some(second)) => [first, second],
            _ => return chain(resolved, Vec::new()),
        }
    } else {
        match tally(&resolved, &captain_ballot).as_slice() {
            [best, second, ..] => [second.user_id, best.user_id],
            _ => return chain(resolved, Vec::new()),
        }
    };

    let pool = voting
        .players
        .iter()
        .copied()
        .filter(|player| !captains.contains(player))
        .collect();
    let picking = Picking::new(host, captains, pool, resolved.settings.max_players);
    let held_vote = !(host_ballot.is_empty() && captain_ballot.is_empty());
    let finalized = if held_vote {
        resolved.main_content()
    } else {
        None
    };
    let next = resolved.enter(Phase::Picking(picking), finalized);
    chain(resolved, vec![Step::Advance(next)])
}

pub(crate) fn messages(snapshot: &Snapshot, voting: &Voting) -> DesiredMessages {
    let host_ballot = voting.host_ballot();
    let captain_ballot = voting.captain_ballot();

    let host_value = match voting.hosts.len() {
        0 => "Nobody volunteered to host.".to_owned(),
        1 => format!("{} is hosting.", mentions(&voting.hosts)),
        _ => ballot_lines(&tally(snapshot, &host_ballot)),
    };
    let candidates = voting.captain_candidates();
    let captain_value = if captain_ballot.is_empty() {
        format!("{} are captains.", mentions(&candidates))
    } else {
        ballot_lines(&tally(snapshot, &captain_ballot))
    };

    let embed = Embed::new("**Vote for host and captains**", COLOUR)
        .description("React with the emoji next to someone's name to vote for them.")
        .field("Host", host_value)
        .field("Captains", captain_value)
        .footer(format!(
            "Each vote ends once {} people have voted in it. \
             Admins can react with {SKIP_EMOJI} to end voting now.",
            snapshot.settings.min_votes
        ));

    let mut messages = DesiredMessages::new();
    messages.insert(MessageKey::Main, MessageContent::Embed(embed));
    messages.extend(history_messages(&snapshot.history));
    messages
}

fn ballot_lines(tallies: &[Tally]) -> String {
    let mut sorted: Vec<&Tally> = tallies.iter().collect();
    sorted.sort_by_key(|tally| tally.user_id);
    sorted
        .iter()
        .map(|tally| format!("{}  {}  ({})", tally.emoji, mention(tally.user_id), tally.votes))
        .collect::<Vec<_>>()
        .join("\n")
}
