//! Drives a channel session from one snapshot to the next.
//!
//! Every trigger installs a new snapshot under the session lock, then walks
//! its `on_update` chain, reconciling the channel after each step. A chain
//! whose starting snapshot has been replaced by a newer trigger stops at the
//! next step it would have applied.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    backend::ChatBackend,
    services::reconciler::{self, SyncError},
    state::{
        react::{MessageId, React},
        session::{ChannelSession, SessionInner},
        snapshot::{Phase, Snapshot},
        transitions::StateSequence,
    },
};

/// A reaction appearing on or disappearing from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactEvent {
    /// Reaction added.
    Added(React),
    /// Reaction removed.
    Removed(React),
}

/// Replace the session's snapshot with `transition(current)` and render the
/// resulting chain.
pub async fn update_state<F>(
    backend: &dyn ChatBackend,
    session: &ChannelSession,
    transition: F,
) -> Result<(), SyncError>
where
    F: FnOnce(&Snapshot) -> Snapshot,
{
    let start = {
        let mut inner = session.lock().await;
        let next = transition(&inner.state);
        install(&mut inner, next)
    };
    drive(backend, session, start).await
}

/// Fold a reaction event into the session and render the consequences.
///
/// Events for anything but the main message of an active PUG are ignored.
/// Returns whether the event was applied.
pub async fn update_reacts(
    backend: &dyn ChatBackend,
    session: &ChannelSession,
    message_id: MessageId,
    event: ReactEvent,
) -> Result<bool, SyncError> {
    let start = {
        let mut inner = session.lock().await;
        if inner.state.phase == Phase::Stopped || inner.main_message_id() != Some(message_id) {
            debug!(
                channel_id = session.channel_id(),
                message_id, "reaction on untracked message ignored"
            );
            return Ok(false);
        }
        match event {
            ReactEvent::Added(react) => inner.reacts.insert(react),
            ReactEvent::Removed(react) => inner.reacts.remove(&react),
        };
        let next = inner.state.with_reacts(inner.reacts.clone());
        install(&mut inner, next)
    };
    drive(backend, session, start).await?;
    Ok(true)
}

fn install(inner: &mut SessionInner, next: Snapshot) -> Arc<Snapshot> {
    let next = Arc::new(next);
    inner.state = next.clone();
    next
}

async fn drive(
    backend: &dyn ChatBackend,
    session: &ChannelSession,
    mut current: Arc<Snapshot>,
) -> Result<(), SyncError> {
    let channel_id = session.channel_id();
    let mut sequence = StateSequence::new((*current).clone());

    while let Some(next) = sequence.next().await {
        let mut inner = session.lock().await;
        if !Arc::ptr_eq(&inner.state, &current) {
            debug!(channel_id, phase = next.phase.name(), "update chain superseded");
            return Ok(());
        }

        let messages = next.messages();
        let old_main = inner.main_message_id();
        let msg_id_map = reconciler::sync(
            backend,
            channel_id,
            &inner.msg_id_map,
            &inner.messages,
            &messages,
            &inner.reacts,
            &next.reacts,
        )
        .await?;
        let new_main = msg_id_map.first().map(|(_, id)| *id);

        inner.msg_id_map = msg_id_map;
        inner.messages = messages;
        inner.reacts = next.reacts.clone();
        let restart = old_main != new_main;
        if current.phase.name() != next.phase.name() {
            info!(
                channel_id,
                from = current.phase.name(),
                to = next.phase.name(),
                "phase changed"
            );
        }
        current = install(&mut inner, next);
        drop(inner);

        // the new main message carries only what was just put on it
        if restart {
            debug!(channel_id, ?old_main, ?new_main, "main message replaced; restarting chain");
            sequence = StateSequence::new((*current).clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, time::Duration};

    use super::*;
    use crate::{
        backend::{BackendCall, RecordingBackend},
        config::PugSettings,
        state::{
            content::MessageKey,
            phase::{Picking, Running, picking::LETTERS},
            react::{CAPT_EMOJI, HOST_EMOJI, ReactSet},
            snapshot::fixtures::*,
        },
    };

    const CHANNEL: u64 = 77;

    fn started() -> (RecordingBackend, ChannelSession) {
        (RecordingBackend::new(BOT_ID), ChannelSession::new(CHANNEL, stopped()))
    }

    fn bot_emojis(backend: &RecordingBackend, message_id: MessageId) -> Vec<String> {
        backend
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::AddReaction {
                    message_id: id,
                    emoji,
                    ..
                } if id == message_id => Some(emoji),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn start_renders_idle_with_bot_reacts() {
        let (backend, session) = started();
        update_state(&backend, &session, |state| state.start(ADMIN_ID))
            .await
            .unwrap();

        let inner = session.lock().await;
        assert_eq!(inner.state.phase, Phase::Idle);
        assert_eq!(inner.msg_id_map.keys().next(), Some(&MessageKey::Main));
        let main = inner.main_message_id().unwrap();
        let mut emojis = bot_emojis(&backend, main);
        emojis.sort();
        let mut expected = vec![HOST_EMOJI.to_owned(), CAPT_EMOJI.to_owned()];
        expected.sort();
        assert_eq!(emojis, expected);
        assert_eq!(backend.count("send"), 1);
        assert_eq!(inner.reacts.len(), 2);
    }

    #[tokio::test]
    async fn reactions_on_other_messages_are_ignored() {
        let (backend, session) = started();
        update_state(&backend, &session, |state| state.start(ADMIN_ID))
            .await
            .unwrap();
        backend.clear_calls();

        let main = session.lock().await.main_message_id().unwrap();
        let applied = update_reacts(
            &backend,
            &session,
            main + 1,
            ReactEvent::Added(React::new(5, "x")),
        )
        .await
        .unwrap();
        assert!(!applied);
        assert!(backend.calls().is_empty());
        assert!(!session.snapshot().await.reacts.contains(&React::new(5, "x")));
    }

    #[tokio::test]
    async fn player_reaction_updates_the_roster() {
        let (backend, session) = started();
        update_state(&backend, &session, |state| state.start(ADMIN_ID))
            .await
            .unwrap();
        backend.clear_calls();

        let main = session.lock().await.main_message_id().unwrap();
        let applied = update_reacts(
            &backend,
            &session,
            main,
            ReactEvent::Added(React::new(5, "x")),
        )
        .await
        .unwrap();
        assert!(applied);
        assert_eq!(backend.count("edit"), 1);
        assert_eq!(backend.count("send"), 0);
        assert!(session.snapshot().await.reacts.contains(&React::new(5, "x")));

        update_reacts(
            &backend,
            &session,
            main,
            ReactEvent::Removed(React::new(5, "x")),
        )
        .await
        .unwrap();
        assert!(!session.snapshot().await.reacts.contains(&React::new(5, "x")));
    }

    #[tokio::test]
    async fn stop_keeps_history_only() {
        let (backend, session) = started();
        update_state(&backend, &session, |state| state.start(ADMIN_ID))
            .await
            .unwrap();
        update_state(&backend, &session, Snapshot::stop).await.unwrap();

        let inner = session.lock().await;
        assert_eq!(inner.state.phase, Phase::Stopped);
        assert!(inner.msg_id_map.is_empty());
        assert_eq!(backend.count("delete"), 1);
    }

    fn running() -> Phase {
        Phase::Running(Running {
            host: Some(50),
            teams: [vec![1, 2], vec![3, 4]],
        })
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_chain_is_abandoned() {
        let backend = Arc::new(RecordingBackend::new(BOT_ID));
        let session = Arc::new(ChannelSession::new(CHANNEL, stopped()));

        let first = tokio::spawn({
            let (backend, session) = (backend.clone(), session.clone());
            async move {
                update_state(&*backend, &session, |state| {
                    state.start(ADMIN_ID).enter(running(), None)
                })
                .await
            }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;

        let main = session.lock().await.main_message_id().unwrap();
        let second = tokio::spawn({
            let (backend, session) = (backend.clone(), session.clone());
            async move {
                update_reacts(
                    &*backend,
                    &session,
                    main,
                    ReactEvent::Added(React::new(60, "x")),
                )
                .await
            }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;

        first.await.unwrap().unwrap();
        assert!(matches!(session.snapshot().await.phase, Phase::Running(_)));

        assert!(second.await.unwrap().unwrap());
        let state = session.snapshot().await;
        assert_eq!(state.phase, Phase::Stopped);
        assert_eq!(state.history.len(), 1);
    }

    #[tokio::test]
    async fn reactions_on_stopped_history_are_ignored() {
        let (backend, session) = started();
        update_state(&backend, &session, |state| {
            state.enter(Phase::Stopped, Some("last game".into()))
        })
        .await
        .unwrap();
        let history = session.lock().await.main_message_id().unwrap();
        backend.clear_calls();

        let applied = update_reacts(
            &backend,
            &session,
            history,
            ReactEvent::Added(React::new(5, "x")),
        )
        .await
        .unwrap();
        assert!(!applied);
        assert!(backend.calls().is_empty());
    }

    async fn react(backend: &RecordingBackend, session: &ChannelSession, react: React) {
        let main = session.lock().await.main_message_id().unwrap();
        let applied = update_reacts(backend, session, main, ReactEvent::Added(react))
            .await
            .unwrap();
        assert!(applied);
    }

    #[tokio::test]
    async fn closing_sign_ups_keeps_roster_above_new_main() {
        let settings = PugSettings {
            min_players: 2,
            ..PugSettings::default()
        };
        let backend = RecordingBackend::new(BOT_ID);
        let session = ChannelSession::new(
            CHANNEL,
            Snapshot::stopped(BOT_ID, Arc::new(settings), BTreeSet::from([ADMIN_ID])),
        );
        update_state(&backend, &session, |state| state.start(ADMIN_ID))
            .await
            .unwrap();
        let idle_main = session.lock().await.main_message_id().unwrap();

        react(&backend, &session, React::new(10, HOST_EMOJI)).await;
        react(&backend, &session, React::new(11, HOST_EMOJI)).await;
        react(&backend, &session, React::new(20, CAPT_EMOJI)).await;
        backend.clear_calls();
        react(&backend, &session, React::new(21, CAPT_EMOJI)).await;

        let inner = session.lock().await;
        let Phase::Voting(voting) = &inner.state.phase else {
            panic!("expected voting, got {}", inner.state.phase.name());
        };
        let keys: Vec<MessageKey> = inner.msg_id_map.keys().copied().collect();
        assert_eq!(keys, vec![MessageKey::Main, MessageKey::History(0)]);
        assert_eq!(inner.msg_id_map[&MessageKey::History(0)], idle_main);
        let new_main = inner.main_message_id().unwrap();
        assert!(new_main > idle_main);

        // the roster is finalised in place, then only the new main is sent
        assert!(matches!(
            backend.calls().first(),
            Some(BackendCall::Edit { message_id, .. }) if *message_id == idle_main
        ));
        assert_eq!(backend.count("edit"), 1);
        assert_eq!(backend.count("send"), 1);
        assert_eq!(backend.count("delete"), 0);
        assert_eq!(backend.count("clear_reactions"), 0);
        assert_eq!(backend.count("clear_reaction"), 0);
        assert_eq!(backend.count("remove_reaction"), 0);

        let mut ballot = voting.ballot_emojis();
        ballot.sort();
        assert_eq!(ballot.len(), 2);
        let mut offered = bot_emojis(&backend, new_main);
        offered.sort();
        assert_eq!(offered, ballot);
        let expected: ReactSet = ballot.iter().map(|emoji| React::new(BOT_ID, *emoji)).collect();
        assert_eq!(inner.reacts, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_step_keeps_last_applied_render() {
        let backend = Arc::new(RecordingBackend::new(BOT_ID));
        let session = Arc::new(ChannelSession::new(CHANNEL, stopped()));

        let chain = tokio::spawn({
            let (backend, session) = (backend.clone(), session.clone());
            async move {
                update_state(&*backend, &session, |state| {
                    state.start(ADMIN_ID).enter(running(), None)
                })
                .await
            }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;

        let (map, messages) = {
            let inner = session.lock().await;
            (inner.msg_id_map.clone(), inner.messages.clone())
        };
        assert!(!map.is_empty());
        backend.fail_next(1);

        let err = chain.await.unwrap().unwrap_err();
        assert!(matches!(err, SyncError::Backend(_)));
        let inner = session.lock().await;
        assert_eq!(inner.msg_id_map, map);
        assert_eq!(inner.messages, messages);
        assert!(matches!(inner.state.phase, Phase::Running(_)));
    }

    #[tokio::test]
    async fn letter_of_a_picked_player_is_ignored() {
        const RED: u64 = 1;
        const BLUE: u64 = 2;
        let (backend, session) = started();
        let draft = Picking::new(None, [RED, BLUE], BTreeSet::from([3, 4, 5, 6]), 12);
        update_state(&backend, &session, |state| {
            state.start(ADMIN_ID).enter(Phase::Picking(draft), None)
        })
        .await
        .unwrap();

        let teams = |state: &Arc<Snapshot>| match &state.phase {
            Phase::Picking(picking) => picking.teams.clone(),
            other => panic!("expected picking, got {}", other.name()),
        };

        react(&backend, &session, React::new(RED, LETTERS[0])).await;
        assert_eq!(teams(&session.snapshot().await), [vec![RED, 3], vec![BLUE]]);

        react(&backend, &session, React::new(BLUE, LETTERS[0])).await;
        assert_eq!(teams(&session.snapshot().await), [vec![RED, 3], vec![BLUE]]);

        react(&backend, &session, React::new(BLUE, LETTERS[1])).await;
        assert_eq!(teams(&session.snapshot().await), [vec![RED, 3], vec![BLUE, 4]]);
    }
}
