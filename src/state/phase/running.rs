//! Teams are final; the game is being played.

use std::collections::BTreeSet;

use crate::state::{
    content::{DesiredMessages, Embed, MessageContent, MessageKey, history_messages},
    react::{DONE_EMOJI, UserId},
    snapshot::{Phase, Snapshot},
    transitions::Step,
};

use super::{chain, mentions, with_teams};

const COLOUR: u32 = 0x42f560;
const SUMMARY_COLOUR: u32 = 0x99aab5;

/// Team members needed to agree the game is over.
const MEMBERS_TO_FINISH: usize = 2;

/// Rosters of a game in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Running {
    /// Elected host.
    pub host: Option<UserId>,
    /// Both rosters, captains first.
    pub teams: [Vec<UserId>; 2],
}

impl Running {
    /// Host and every team member.
    pub fn participants(&self) -> BTreeSet<UserId> {
        self.host
            .iter()
            .chain(self.teams.iter().flatten())
            .copied()
            .collect()
    }

    /// Final record of the game, appended to history when it concludes.
    pub fn summary(&self) -> MessageContent {
        let embed = Embed::new("**PUG finished**", SUMMARY_COLOUR);
        with_teams(embed, self.host, &self.teams).into()
    }
}

pub(crate) fn on_update(snapshot: &Snapshot, running: &Running) -> Vec<Step> {
    let resolved = snapshot.with_bot_reacts([DONE_EMOJI]);
    let finished = resolved.enter(Phase::Stopped, Some(running.summary()));

    let members: BTreeSet<UserId> = running.teams.iter().flatten().copied().collect();
    let done_by: BTreeSet<UserId> = resolved
        .user_reacts()
        .filter(|react| react.emoji == DONE_EMOJI)
        .map(|react| react.user_id)
        .collect();
    let done = done_by.intersection(&members).count() >= MEMBERS_TO_FINISH
        || !done_by.is_disjoint(&resolved.admin_ids);

    let then = if done {
        vec![Step::Advance(finished)]
    } else {
        vec![
            Step::Wait(resolved.settings.running_timeout),
            Step::Advance(finished),
        ]
    };
    chain(resolved, then)
}

pub(crate) fn messages(snapshot: &Snapshot, running: &Running) -> DesiredMessages {
    let embed = Embed::new("**Teams are set**", COLOUR)
        .description(format!("React with {DONE_EMOJI} once the game is done."));
    let embed = with_teams(embed, running.host, &running.teams);

    let mut messages = DesiredMessages::new();
    messages.insert(MessageKey::Main, MessageContent::Embed(embed));
    messages.extend(history_messages(&snapshot.history));
    messages.insert(
        MessageKey::Notify(snapshot.history.len()),
        format!("{} teams are ready!", mentions(&running.participants())).into(),
    );
    messages
}
