//! Captains draft players in a snake order.

use std::collections::BTreeSet;

use crate::state::{
    content::{DesiredMessages, Embed, MessageContent, MessageKey, history_messages},
    react::{UserId, mention},
    snapshot::{Phase, Snapshot},
    transitions::Step,
};

use super::{Running, TEAM_NAMES, chain, with_teams};

const COLOUR: u32 = 0xf58a42;

/// Which team picks on each turn. Turns past the end alternate.
pub const PICK_ORDER: &[usize] = &[0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 0];

/// Regional indicator letters bound to pickable players, in id order.
pub const LETTERS: &[&str] = &[
    "🇦", "🇧", "🇨", "🇩", "🇪", "🇫", "🇬", "🇭", "🇮", "🇯", "🇰", "🇱", "🇲", "🇳", "🇴", "🇵", "🇶",
    "🇷", "🇸", "🇹",
];

/// Draft in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picking {
    /// Elected host, if anyone volunteered.
    pub host: Option<UserId>,
    /// Both rosters; each starts with its captain.
    pub teams: [Vec<UserId>; 2],
    /// Pickable players. The player at index `i` is picked with `LETTERS[i]`.
    pub candidates: Vec<UserId>,
    /// Final size of each team, captain included.
    pub team_size: usize,
}

impl Picking {
    /// Start a draft. `captains[0]` picks first.
    pub fn new(
        host: Option<UserId>,
        captains: [UserId; 2],
        pool: BTreeSet<UserId>,
        max_players: usize,
    ) -> Self {
        let candidates: Vec<UserId> = pool.into_iter().take(LETTERS.len()).collect();
        let team_size = max_players.min(2 + candidates.len()) / 2;
        Self {
            host,
            teams: [vec![captains[0]], vec![captains[1]]],
            candidates,
            team_size,
        }
    }

    /// Both captains, first picker first.
    pub fn captains(&self) -> [UserId; 2] {
        [self.teams[0][0], self.teams[1][0]]
    }

    fn is_picked(&self, user_id: UserId) -> bool {
        self.teams.iter().any(|team| team.contains(&user_id))
    }

    /// Players still available, with the letter that picks them.
    pub fn unpicked(&self) -> impl Iterator<Item = (UserId, &'static str)> + '_ {
        self.candidates
            .iter()
            .copied()
            .zip(LETTERS.iter().copied())
            .filter(|(user_id, _)| !self.is_picked(*user_id))
    }

    /// Team whose captain picks next, or `None` once both teams are full.
    pub fn turn(&self) -> Option<usize> {
        let full = |team: usize| self.teams[team].len() >= self.team_size;
        if full(0) && full(1) {
            return None;
        }
        let picks = self.teams.iter().map(Vec::len).sum::<usize>() - 2;
        let team = PICK_ORDER.get(picks).copied().unwrap_or(picks % 2);
        Some(if full(team) { 1 - team } else { team })
    }

    /// Copy of this draft with `user_id` added to `team`.
    pub fn pick(&self, team: usize, user_id: UserId) -> Self {
        let mut next = self.clone();
        next.teams[team].push(user_id);
        next
    }
}

pub(crate) fn on_update(snapshot: &Snapshot, picking: &Picking) -> Vec<Step> {
    let letters: Vec<&str> = picking.unpicked().map(|(_, letter)| letter).collect();
    let resolved = snapshot.with_bot_reacts(letters);

    let Some(team) = picking.turn() else {
        let running = Running {
            host: picking.host,
            teams: picking.teams.clone(),
        };
        let next = resolved.enter(Phase::Running(running), None);
        return chain(resolved, vec![Step::Advance(next)]);
    };

    let captain = picking.teams[team][0];
    let choice = picking.unpicked().find(|(_, letter)| {
        resolved
            .user_reacts()
            .any(|react| react.user_id == captain && react.emoji == *letter)
    });
    let then = match choice {
        Some((user_id, _)) => {
            let next = resolved.with_phase(Phase::Picking(picking.pick(team, user_id)));
            vec![Step::Advance(next)]
        }
        None => Vec::new(),
    };
    chain(resolved, then)
}

pub(crate) fn messages(snapshot: &Snapshot, picking: &Picking) -> DesiredMessages {
    let status = match picking.turn() {
        Some(team) => format!(
            "{} ({}), pick a player by reacting with their letter.",
            mention(picking.teams[team][0]),
            TEAM_NAMES[team],
        ),
        None => "Teams are full.".to_owned(),
    };
    let available = picking
        .unpicked()
        .map(|(user_id, letter)| format!("{letter}  {}", mention(user_id)))
        .collect::<Vec<_>>()
        .join("\n");

    let embed = Embed::new("**Captains are picking**", COLOUR).description(status);
    let embed = with_teams(embed, picking.host, &picking.teams)
        .wide_field("Available players", available)
        .footer(format!("Teams of {}", picking.team_size));

    let mut messages = DesiredMessages::new();
    messages.insert(MessageKey::Main, MessageContent::Embed(embed));
    messages.extend(history_messages(&snapshot.history));
    messages
}
