//! Sign-up phase: people react to queue as host, captain, or player.

use std::collections::BTreeSet;

use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};

use crate::{
    config::PugSettings,
    state::{
        content::{DesiredMessages, Embed, MessageContent, MessageKey, history_messages},
        react::{CAPT_EMOJI, HOST_EMOJI, LAPTOP_MAN, SKIP_EMOJI, UserId, WAIT_EMOJI, stable_hash},
        snapshot::{Phase, Snapshot},
        transitions::Step,
    },
};

use super::{Voting, chain, mentions};

const COLOUR: u32 = 0xf5d442;

/// Sign-ups derived from the reactions on the idle message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    /// Users reacting with the host emoji.
    pub hosts: BTreeSet<UserId>,
    /// Users reacting with the captain emoji.
    pub captains: BTreeSet<UserId>,
    /// Users with any reaction other than host or an admin control.
    /// Captains are players; a host reaction alone doesn't make one.
    pub players: BTreeSet<UserId>,
    /// Admins holding the PUG with the wait emoji.
    pub waiting: BTreeSet<UserId>,
    /// Admins forcing the PUG forward with the skip emoji.
    pub skipping: BTreeSet<UserId>,
}

impl Roster {
    /// Classify the reactions of `snapshot`, ignoring the bot's own.
    pub fn classify(snapshot: &Snapshot) -> Self {
        let waiting = snapshot.admins_reacting(WAIT_EMOJI);
        let skipping = snapshot.admins_reacting(SKIP_EMOJI);

        let mut hosts = BTreeSet::new();
        let mut captains = BTreeSet::new();
        let mut players = BTreeSet::new();
        for react in snapshot.user_reacts() {
            let user = react.user_id;
            match react.emoji.as_str() {
                HOST_EMOJI => {
                    hosts.insert(user);
                }
                CAPT_EMOJI => {
                    captains.insert(user);
                    players.insert(user);
                }
                WAIT_EMOJI if waiting.contains(&user) => {}
                SKIP_EMOJI if skipping.contains(&user) => {}
                _ => {
                    players.insert(user);
                }
            }
        }

        Self {
            hosts,
            captains,
            players,
            waiting,
            skipping,
        }
    }

    /// Whether every sign-up threshold is met.
    pub fn enough_people(&self, settings: &PugSettings) -> bool {
        self.hosts.len() >= settings.min_hosts
            && self.captains.len() >= settings.min_captains
            && self.players.len() >= settings.min_players
    }

    /// Whether sign-ups should close now. An admin pause always wins.
    pub fn should_advance(&self, settings: &PugSettings) -> bool {
        self.waiting.is_empty() && (self.enough_people(settings) || !self.skipping.is_empty())
    }
}

pub(crate) fn on_update(snapshot: &Snapshot) -> Vec<Step> {
    let resolved = snapshot.with_bot_reacts([HOST_EMOJI, CAPT_EMOJI]);
    let roster = Roster::classify(&resolved);

    let mut then = Vec::new();
    if roster.should_advance(&resolved.settings) {
        let voting = Voting::new(&roster);
        then.push(Step::Advance(
            resolved.enter(Phase::Voting(voting), resolved.main_content()),
        ));
    }
    chain(resolved, then)
}

pub(crate) fn messages(snapshot: &Snapshot) -> DesiredMessages {
    let roster = Roster::classify(snapshot);
    let settings = &snapshot.settings;

    let status = if !roster.waiting.is_empty() {
        format!(
            "PUG paused by {}. Waiting for them to unpause...",
            mentions(&roster.waiting)
        )
    } else if roster.should_advance(settings) {
        "PUG starting now...".to_owned()
    } else {
        format!(
            "The PUG will start when there's at least {} host, {} captains, and {} players.\n\
             {} can stop the PUG from starting by reacting with {WAIT_EMOJI}",
            settings.min_hosts,
            settings.min_captains,
            settings.min_players,
            mentions(&snapshot.admin_ids),
        )
    };

    let embed = Embed::new("**Waiting for players**", COLOUR)
        .description(format!(
            "React with {HOST_EMOJI} if you can host.\n\
             React with {CAPT_EMOJI} to captain.\n\
             React with anything else to play.\n"
        ))
        .field(
            format!("{HOST_EMOJI}  {} hosts", roster.hosts.len()),
            mentions(&roster.hosts),
        )
        .field(
            format!("{CAPT_EMOJI}  {} captains", roster.captains.len()),
            mentions(&roster.captains),
        )
        .wide_field(
            format!("{}  {} players", player_emoji(snapshot), roster.players.len()),
            mentions(&roster.players),
        )
        .wide_field("Status", status);

    let mut messages = DesiredMessages::new();
    messages.insert(MessageKey::Main, MessageContent::Embed(embed));
    messages.extend(history_messages(&snapshot.history));
    messages
}

/// One of the emojis people reacted with to play, stable for a given reaction set.
fn player_emoji(snapshot: &Snapshot) -> String {
    let choices: BTreeSet<&str> = snapshot
        .reacts
        .iter()
        .map(|react| react.emoji.as_str())
        .filter(|emoji| ![HOST_EMOJI, CAPT_EMOJI, SKIP_EMOJI, WAIT_EMOJI].contains(emoji))
        .collect();
    let choices: Vec<&str> = choices.into_iter().collect();
    let mut rng = StdRng::seed_from_u64(stable_hash(&choices));
    choices
        .choose(&mut rng)
        .copied()
        .unwrap_or(LAPTOP_MAN)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        react::{React, ReactSet, reacts_from},
        snapshot::fixtures::*,
    };

    fn add(snapshot: &Snapshot, reacts: impl IntoIterator<Item = React>) -> Snapshot {
        let mut all = snapshot.reacts.clone();
        all.extend(reacts);
        snapshot.with_reacts(all)
    }

    fn last_phase(steps: &[Step]) -> &'static str {
        steps
            .iter()
            .rev()
            .find_map(|step| match step {
                Step::Advance(snapshot) => Some(snapshot.phase.name()),
                Step::Wait(_) => None,
            })
            .unwrap_or("none")
    }

    fn min_puggers() -> ReactSet {
        let settings = PugSettings::default();
        let mut reacts = ReactSet::new();
        reacts.extend((0..settings.min_hosts as u64).map(|u| React::new(100 + u, HOST_EMOJI)));
        reacts.extend((0..settings.min_captains as u64).map(|u| React::new(200 + u, CAPT_EMOJI)));
        reacts.extend(
            (0..settings.min_players as u64).map(|u| React::new(300 + u, ["a", "b", "c"][u as usize % 3])),
        );
        reacts
    }

    #[test]
    fn classification_matches_sign_up_rules() {
        let admins = [1u64, 2];
        let mut state = idle();
        state.admin_ids.extend(admins);
        assert_eq!(Roster::classify(&state).players.len(), 0);

        // bot reacts don't count towards anything
        state = add(
            &state,
            reacts_from(BOT_ID, [HOST_EMOJI, CAPT_EMOJI, SKIP_EMOJI, WAIT_EMOJI]),
        );
        let roster = Roster::classify(&state);
        assert!(roster.hosts.is_empty() && roster.captains.is_empty() && roster.players.is_empty());

        // admin controls don't count towards players
        state = add(&state, admins.iter().map(|a| React::new(*a, SKIP_EMOJI)));
        state = add(&state, admins.iter().map(|a| React::new(*a, WAIT_EMOJI)));
        let roster = Roster::classify(&state);
        assert_eq!(roster.skipping.len(), 2);
        assert_eq!(roster.waiting.len(), 2);
        assert!(roster.players.is_empty());

        // hosts don't count as players
        state = add(&state, (10..13).map(|u| React::new(u, HOST_EMOJI)));
        let roster = Roster::classify(&state);
        assert_eq!(roster.hosts.len(), 3);
        assert!(roster.players.is_empty());

        // captains count as players
        state = add(&state, (20..22).map(|u| React::new(u, CAPT_EMOJI)));
        let roster = Roster::classify(&state);
        assert_eq!(roster.captains.len(), 2);
        assert_eq!(roster.players.len(), 2);

        // anything else is a player, counted once per user
        state = add(&state, (30..40).map(|u| React::new(u, "x")));
        state = add(&state, (30..40).map(|u| React::new(u, "y")));
        let roster = Roster::classify(&state);
        assert_eq!(roster.players.len(), 12);

        // a non-admin wait react is just a player react
        state = add(&state, [React::new(50, WAIT_EMOJI)]);
        assert!(Roster::classify(&state).players.contains(&50));

        assert!(state.messages().contains_key(&MessageKey::Main));
    }

    #[test]
    fn stays_idle_without_signups() {
        let steps = on_update(&idle());
        assert_eq!(last_phase(&steps), "idle");
    }

    #[test]
    fn advances_when_thresholds_met() {
        let steps = on_update(&idle().with_reacts(min_puggers()));
        assert_eq!(last_phase(&steps), "voting");
    }

    #[test]
    fn admin_wait_holds_even_with_skip() {
        let mut reacts = min_puggers();
        reacts.insert(React::new(ADMIN_ID, WAIT_EMOJI));
        assert_eq!(last_phase(&on_update(&idle().with_reacts(reacts.clone()))), "idle");

        reacts.insert(React::new(ADMIN_ID, SKIP_EMOJI));
        assert_eq!(last_phase(&on_update(&idle().with_reacts(reacts))), "idle");
    }

    #[test]
    fn admin_skip_advances_below_thresholds() {
        let reacts = ReactSet::from([React::new(ADMIN_ID, SKIP_EMOJI)]);
        assert_eq!(last_phase(&on_update(&idle().with_reacts(reacts))), "voting");
    }

    #[test]
    fn non_admin_skip_is_ignored() {
        let reacts = ReactSet::from([React::new(77, SKIP_EMOJI)]);
        assert_eq!(last_phase(&on_update(&idle().with_reacts(reacts))), "idle");
    }

    #[test]
    fn transition_records_signup_message_in_history() {
        let start = idle().with_reacts(min_puggers());
        let steps = on_update(&start);
        let Some(Step::Advance(voting)) = steps.last() else {
            panic!("expected a voting snapshot");
        };
        assert_eq!(voting.history.len(), 1);
        assert!(voting.reacts.is_empty());
        let Step::Advance(resolved) = &steps[0] else {
            panic!("expected resolved idle snapshot");
        };
        assert_eq!(Some(voting.history[0].clone()), resolved.main_content());
    }

    #[test]
    fn threshold_is_monotone_in_reactions() {
        let settings = PugSettings::default();
        let base = idle().with_reacts(min_puggers());
        assert!(Roster::classify(&base).enough_people(&settings));
        let extras = [
            React::new(100, "z"),
            React::new(300, HOST_EMOJI),
            React::new(301, CAPT_EMOJI),
            React::new(400, HOST_EMOJI),
            React::new(401, "q"),
        ];
        let mut state = base;
        for extra in extras {
            state = add(&state, [extra]);
            assert!(Roster::classify(&state).enough_people(&settings));
        }
    }

    #[test]
    fn player_emoji_is_stable() {
        let state = idle().with_reacts(ReactSet::from([React::new(1, "a"), React::new(2, "b")]));
        assert_eq!(player_emoji(&state), player_emoji(&state.clone()));
        assert_eq!(player_emoji(&idle()), LAPTOP_MAN);
    }
}
