//! Per-channel session: the latest snapshot plus what is actually on screen.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{Mutex, MutexGuard};

use crate::state::{
    content::{DesiredMessages, MessageKey},
    react::{ChannelId, MessageId, ReactSet},
    snapshot::Snapshot,
};

/// Mutable part of a [`ChannelSession`], only reachable through its lock.
#[derive(Debug)]
pub struct SessionInner {
    /// Latest snapshot; identity marks which update chain is current.
    pub state: Arc<Snapshot>,
    /// Messages the bot owns in the channel, by logical key. Position 0 is main.
    pub msg_id_map: IndexMap<MessageKey, MessageId>,
    /// Content last successfully applied for each key in `msg_id_map`.
    pub messages: DesiredMessages,
    /// Reactions believed to be on the main message.
    pub reacts: ReactSet,
}

impl SessionInner {
    /// Id of the main message, if one is rendered.
    pub fn main_message_id(&self) -> Option<MessageId> {
        self.msg_id_map.first().map(|(_, id)| *id)
    }
}

/// A PUG bound to one channel.
///
/// The lock is held for the whole of a reconciliation, so at most one sync
/// runs per channel. Sessions in different channels never contend.
#[derive(Debug)]
pub struct ChannelSession {
    channel_id: ChannelId,
    inner: Mutex<SessionInner>,
}

impl ChannelSession {
    /// New session with nothing rendered yet.
    pub fn new(channel_id: ChannelId, state: Snapshot) -> Self {
        Self {
            channel_id,
            inner: Mutex::new(SessionInner {
                state: Arc::new(state),
                msg_id_map: IndexMap::new(),
                messages: DesiredMessages::new(),
                reacts: ReactSet::new(),
            }),
        }
    }

    /// Channel this session renders into.
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Acquire the session lock.
    pub async fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().await
    }

    /// Current snapshot without holding the lock afterwards.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.lock().await.state.clone()
    }
}
