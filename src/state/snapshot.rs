//! Immutable PUG snapshots.
//!
//! A [`Snapshot`] is never mutated once published to a channel session; every
//! transition builds a new value. The scheduler relies on this: it detects
//! superseded update chains by `Arc` identity, and detects fixpoints by value
//! equality.

use std::{collections::BTreeSet, sync::Arc};

use crate::{
    config::PugSettings,
    state::{
        content::{DesiredMessages, MessageContent, MessageKey, history_messages},
        phase::{self, Picking, Running, Voting},
        react::{React, ReactSet, UserId},
        transitions::Step,
    },
};

/// Phase-specific part of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Nothing running; only history is displayed.
    Stopped,
    /// Collecting host/captain/player sign-ups through reactions.
    Idle,
    /// Electing a host and two captains.
    Voting(Voting),
    /// Captains drafting players.
    Picking(Picking),
    /// Teams are final and the game is being played.
    Running(Running),
}

impl Phase {
    /// Stable lowercase name used in logs and the status dump.
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Stopped => "stopped",
            Phase::Idle => "idle",
            Phase::Voting(_) => "voting",
            Phase::Picking(_) => "picking",
            Phase::Running(_) => "running",
        }
    }
}

/// Complete, immutable state of the PUG in one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Identity of the bot; its own reactions never count as input.
    pub bot_id: UserId,
    /// Thresholds in effect for this PUG.
    pub settings: Arc<PugSettings>,
    /// Users allowed to pause/skip/finish.
    pub admin_ids: BTreeSet<UserId>,
    /// Every reaction believed to be present on the main message.
    pub reacts: ReactSet,
    /// Finalized payloads that stay visible as separate messages.
    pub history: Vec<MessageContent>,
    /// Active variant.
    pub phase: Phase,
}

impl Snapshot {
    /// Fresh stopped snapshot for a channel that has never run a PUG.
    pub fn stopped(bot_id: UserId, settings: Arc<PugSettings>, admin_ids: BTreeSet<UserId>) -> Self {
        Self {
            bot_id,
            settings,
            admin_ids,
            reacts: ReactSet::new(),
            history: Vec::new(),
            phase: Phase::Stopped,
        }
    }

    /// Begin collecting sign-ups, granting `admin_id` admin controls.
    pub fn start(&self, admin_id: UserId) -> Self {
        let mut next = self.enter(Phase::Idle, None);
        next.admin_ids.insert(admin_id);
        next
    }

    /// Return to [`Phase::Stopped`], keeping history on screen.
    pub fn stop(&self) -> Self {
        self.enter(Phase::Stopped, None)
    }

    /// Copy of this snapshot in `phase`, with `finalized` appended to history.
    ///
    /// Reactions are cleared: a new phase always renders onto a fresh main
    /// message, so reactions left on the old one are no longer input.
    pub fn enter(&self, phase: Phase, finalized: Option<MessageContent>) -> Self {
        let mut history = self.history.clone();
        history.extend(finalized);
        Self {
            bot_id: self.bot_id,
            settings: self.settings.clone(),
            admin_ids: self.admin_ids.clone(),
            reacts: ReactSet::new(),
            history,
            phase,
        }
    }

    /// Copy of this snapshot with a different reaction set.
    pub fn with_reacts(&self, reacts: ReactSet) -> Self {
        Self {
            reacts,
            ..self.clone()
        }
    }

    /// Copy of this snapshot in which the bot's own reactions are exactly `emojis`.
    pub fn with_bot_reacts<'a>(&self, emojis: impl IntoIterator<Item = &'a str>) -> Self {
        let mut reacts: ReactSet = self
            .reacts
            .iter()
            .filter(|react| react.user_id != self.bot_id)
            .cloned()
            .collect();
        reacts.extend(emojis.into_iter().map(|emoji| React::new(self.bot_id, emoji)));
        self.with_reacts(reacts)
    }

    /// Copy of this snapshot with a replaced phase payload, keeping reactions.
    pub fn with_phase(&self, phase: Phase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }

    /// Reactions not placed by the bot.
    pub fn user_reacts(&self) -> impl Iterator<Item = &React> {
        self.reacts
            .iter()
            .filter(move |react| react.user_id != self.bot_id)
    }

    /// Admins who currently react with `emoji`.
    pub fn admins_reacting(&self, emoji: &str) -> BTreeSet<UserId> {
        self.reacts
            .iter()
            .filter(|react| react.emoji == emoji && self.admin_ids.contains(&react.user_id))
            .map(|react| react.user_id)
            .collect()
    }

    /// Pure projection of the messages this snapshot wants on screen.
    ///
    /// Deterministic for equal snapshots; the reconciler's no-change pass
    /// compares content, not identity.
    pub fn messages(&self) -> DesiredMessages {
        match &self.phase {
            Phase::Stopped => history_messages(&self.history).collect(),
            Phase::Idle => phase::idle::messages(self),
            Phase::Voting(voting) => phase::voting::messages(self, voting),
            Phase::Picking(picking) => phase::picking::messages(self, picking),
            Phase::Running(running) => phase::running::messages(self, running),
        }
    }

    /// Content of the main message, if this snapshot renders one.
    pub fn main_content(&self) -> Option<MessageContent> {
        self.messages().shift_remove(&MessageKey::Main)
    }

    /// Automatic consequences of the current reactions.
    ///
    /// The result may be empty or contain several steps; it is always finite.
    pub fn on_update(&self) -> Vec<Step> {
        match &self.phase {
            Phase::Stopped => vec![Step::Advance(self.clone())],
            Phase::Idle => phase::idle::on_update(self),
            Phase::Voting(voting) => phase::voting::on_update(self, voting),
            Phase::Picking(picking) => phase::picking::on_update(self, picking),
            Phase::Running(running) => phase::running::on_update(self, running),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub const BOT_ID: UserId = 999_999;
    pub const ADMIN_ID: UserId = 1234;

    pub fn settings() -> Arc<PugSettings> {
        Arc::new(PugSettings::default())
    }

    pub fn stopped() -> Snapshot {
        Snapshot::stopped(BOT_ID, settings(), BTreeSet::from([ADMIN_ID]))
    }

    pub fn idle() -> Snapshot {
        stopped().start(ADMIN_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::{fixtures::*, *};

    #[test]
    fn start_grants_admin_and_clears_reacts() {
        let base = stopped().with_reacts(ReactSet::from([React::new(1, "x")]));
        let idle = base.start(42);
        assert_eq!(idle.phase, Phase::Idle);
        assert!(idle.admin_ids.contains(&42));
        assert!(idle.admin_ids.contains(&ADMIN_ID));
        assert!(idle.reacts.is_empty());
    }

    #[test]
    fn enter_appends_history() {
        let next = idle().enter(Phase::Stopped, Some("done".into()));
        assert_eq!(next.history, vec![MessageContent::from("done")]);
        assert_eq!(next.messages().len(), 1);
    }

    #[test]
    fn with_bot_reacts_replaces_only_bot_reacts() {
        let snapshot = idle().with_reacts(ReactSet::from([
            React::new(BOT_ID, "old"),
            React::new(1, "old"),
        ]));
        let next = snapshot.with_bot_reacts(["new"]);
        assert!(next.reacts.contains(&React::new(BOT_ID, "new")));
        assert!(!next.reacts.contains(&React::new(BOT_ID, "old")));
        assert!(next.reacts.contains(&React::new(1, "old")));
    }

    #[test]
    fn stopped_is_a_fixpoint() {
        let snapshot = stopped();
        assert_eq!(snapshot.on_update(), vec![Step::Advance(snapshot.clone())]);
    }

    #[test]
    fn messages_are_deterministic() {
        let snapshot = idle().with_reacts(ReactSet::from([
            React::new(1, "a"),
            React::new(2, "b"),
            React::new(3, "c"),
        ]));
        assert_eq!(snapshot.messages(), snapshot.clone().messages());
    }
}
