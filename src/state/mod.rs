/// Message payloads and keyed message collections.
pub mod content;
/// Per-phase rendering and transition rules.
pub mod phase;
/// Reactions, ids and emoji constants.
pub mod react;
/// Per-channel session and its lock.
pub mod session;
/// Immutable PUG snapshots.
pub mod snapshot;
/// Fixpoint driver for automatic transitions.
pub mod transitions;

use std::{collections::BTreeSet, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry};

use crate::{
    backend::{ChatBackend, RecordingBackend},
    config::AppConfig,
    state::{
        react::{ChannelId, UserId},
        session::ChannelSession,
        snapshot::Snapshot,
    },
};

/// Handle shared by every route and background task.
pub type SharedState = Arc<AppState>;

/// Process-wide state: the messaging backend and every channel session.
pub struct AppState {
    backend: Arc<dyn ChatBackend>,
    config: AppConfig,
    dry_run: bool,
    sessions: DashMap<ChannelId, Arc<ChannelSession>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(backend: Arc<dyn ChatBackend>, config: AppConfig) -> SharedState {
        Arc::new(Self {
            backend,
            config,
            dry_run: false,
            sessions: DashMap::new(),
        })
    }

    /// Like [`AppState::new`], rendering into a [`RecordingBackend`] acting as `bot_id`.
    pub fn dry_run(bot_id: UserId, config: AppConfig) -> SharedState {
        Arc::new(Self {
            backend: Arc::new(RecordingBackend::new(bot_id)),
            config,
            dry_run: true,
            sessions: DashMap::new(),
        })
    }

    /// Whether nothing is actually sent to a chat service.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Backend every session renders through.
    pub fn backend(&self) -> &Arc<dyn ChatBackend> {
        &self.backend
    }

    /// Loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Identity of the bot on the chat service.
    pub fn bot_id(&self) -> UserId {
        self.backend.bot_id()
    }

    /// Whether `user_id` is the configured bot owner.
    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.config.owner_id == Some(user_id)
    }

    /// Stopped snapshot a channel starts from: only the owner is an admin.
    pub fn stopped_snapshot(&self) -> Snapshot {
        let admins: BTreeSet<UserId> = self.config.owner_id.into_iter().collect();
        Snapshot::stopped(self.bot_id(), self.config.pug.clone(), admins)
    }

    /// Session for `channel_id`, if the channel has ever been touched.
    pub fn session(&self, channel_id: ChannelId) -> Option<Arc<ChannelSession>> {
        self.sessions
            .get(&channel_id)
            .map(|entry| entry.value().clone())
    }

    /// Install a fresh session for `channel_id`, detaching `seen`.
    ///
    /// Returns `None` without touching the registry when the channel no
    /// longer holds `seen`, i.e. another session was installed after `seen`
    /// was read.
    pub fn replace_session(
        &self,
        channel_id: ChannelId,
        seen: Option<&Arc<ChannelSession>>,
        state: Snapshot,
    ) -> Option<Arc<ChannelSession>> {
        let session = Arc::new(ChannelSession::new(channel_id, state));
        match self.sessions.entry(channel_id) {
            Entry::Occupied(mut entry) => {
                if !seen.is_some_and(|seen| Arc::ptr_eq(seen, entry.get())) {
                    return None;
                }
                entry.insert(session.clone());
            }
            Entry::Vacant(entry) => {
                entry.insert(session.clone());
            }
        }
        Some(session)
    }

    /// Every known session, in channel id order.
    pub fn sessions(&self) -> Vec<Arc<ChannelSession>> {
        let mut sessions: Vec<_> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by_key(|session| session.channel_id());
        sessions
    }

    /// Forget every session. Messages already rendered stay in their channels.
    pub fn clear_sessions(&self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::snapshot::Phase;

    fn app() -> SharedState {
        AppState::new(Arc::new(RecordingBackend::new(900)), AppConfig::default())
    }

    #[test]
    fn replace_session_installs_into_empty_channel() {
        let state = app();
        let session = state.replace_session(3, None, state.stopped_snapshot());
        assert!(session.is_some());
        assert_eq!(state.sessions().len(), 1);
    }

    #[test]
    fn replace_session_refuses_stale_view() {
        let state = app();
        let first = state
            .replace_session(3, None, state.stopped_snapshot())
            .unwrap();

        // someone else got there between our read and our write
        let winner = state
            .replace_session(3, Some(&first), state.stopped_snapshot().start(7))
            .unwrap();
        assert!(state.replace_session(3, Some(&first), state.stopped_snapshot()).is_none());
        assert!(state.replace_session(3, None, state.stopped_snapshot()).is_none());

        let current = state.session(3).unwrap();
        assert!(Arc::ptr_eq(&current, &winner));
    }

    #[tokio::test]
    async fn cleared_channel_accepts_a_new_session() {
        let state = app();
        let first = state
            .replace_session(3, None, state.stopped_snapshot())
            .unwrap();
        state.clear_sessions();
        let next = state
            .replace_session(3, Some(&first), state.stopped_snapshot())
            .unwrap();
        assert_eq!(next.snapshot().await.phase, Phase::Stopped);
    }
}
