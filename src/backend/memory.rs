use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use futures::future::BoxFuture;
use tracing::debug;

use crate::state::{
    content::MessageContent,
    react::{ChannelId, MessageId, UserId},
};

use super::{BackendError, BackendResult, ChatBackend};

/// First id handed out by [`RecordingBackend::send_message`].
const FIRST_MESSAGE_ID: MessageId = 1_000;

/// A single call observed by the [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BackendCall {
    Send {
        channel_id: ChannelId,
        message_id: MessageId,
        content: MessageContent,
    },
    Edit {
        channel_id: ChannelId,
        message_id: MessageId,
        content: MessageContent,
    },
    Delete {
        channel_id: ChannelId,
        message_id: MessageId,
    },
    AddReaction {
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
    },
    RemoveReaction {
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
        user_id: UserId,
    },
    ClearReaction {
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
    },
    ClearReactions {
        channel_id: ChannelId,
        message_id: MessageId,
    },
}

impl BackendCall {
    /// Short name of the operation.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendCall::Send { .. } => "send",
            BackendCall::Edit { .. } => "edit",
            BackendCall::Delete { .. } => "delete",
            BackendCall::AddReaction { .. } => "add_reaction",
            BackendCall::RemoveReaction { .. } => "remove_reaction",
            BackendCall::ClearReaction { .. } => "clear_reaction",
            BackendCall::ClearReactions { .. } => "clear_reactions",
        }
    }
}

#[derive(Default)]
struct Recorder {
    next_id: AtomicU64,
    calls: Mutex<Vec<BackendCall>>,
    failures: AtomicUsize,
}

/// Backend that performs no I/O and records every call.
///
/// Used when no Discord token is configured, and as the test double for
/// reconciler and scheduler tests.
#[derive(Clone)]
pub struct RecordingBackend {
    bot_id: UserId,
    recorder: Arc<Recorder>,
}

impl RecordingBackend {
    /// Create a backend acting as `bot_id`.
    pub fn new(bot_id: UserId) -> Self {
        let recorder = Recorder {
            next_id: AtomicU64::new(FIRST_MESSAGE_ID),
            ..Recorder::default()
        };
        Self {
            bot_id,
            recorder: Arc::new(recorder),
        }
    }

    /// Every call seen so far, in the order they completed.
    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.recorder.calls).clone()
    }

    /// Number of recorded calls with the given [`BackendCall::kind`].
    pub fn count(&self, kind: &str) -> usize {
        lock(&self.recorder.calls)
            .iter()
            .filter(|call| call.kind() == kind)
            .count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        lock(&self.recorder.calls).clear();
    }

    /// Make the next `count` calls fail without being recorded.
    pub fn fail_next(&self, count: usize) {
        self.recorder.failures.store(count, Ordering::SeqCst);
    }

    fn record<T: Send + 'static>(
        &self,
        call: impl FnOnce() -> (BackendCall, T) + Send + 'static,
    ) -> BoxFuture<'static, BackendResult<T>> {
        let recorder = self.recorder.clone();
        Box::pin(async move {
            let failing = recorder
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(BackendError::Rejected("injected failure".into()));
            }
            let (call, value) = call();
            debug!(call = ?call, "recorded backend call");
            lock(&recorder.calls).push(call);
            Ok(value)
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChatBackend for RecordingBackend {
    fn bot_id(&self) -> UserId {
        self.bot_id
    }

    fn send_message(
        &self,
        channel_id: ChannelId,
        content: MessageContent,
    ) -> BoxFuture<'static, BackendResult<MessageId>> {
        let recorder = self.recorder.clone();
        self.record(move || {
            let message_id = recorder.next_id.fetch_add(1, Ordering::SeqCst);
            let call = BackendCall::Send {
                channel_id,
                message_id,
                content,
            };
            (call, message_id)
        })
    }

    fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: MessageContent,
    ) -> BoxFuture<'static, BackendResult<()>> {
        self.record(move || {
            let call = BackendCall::Edit {
                channel_id,
                message_id,
                content,
            };
            (call, ())
        })
    }

    fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> BoxFuture<'static, BackendResult<()>> {
        self.record(move || {
            let call = BackendCall::Delete {
                channel_id,
                message_id,
            };
            (call, ())
        })
    }

    fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
    ) -> BoxFuture<'static, BackendResult<()>> {
        self.record(move || {
            let call = BackendCall::AddReaction {
                channel_id,
                message_id,
                emoji,
            };
            (call, ())
        })
    }

    fn remove_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
        user_id: UserId,
    ) -> BoxFuture<'static, BackendResult<()>> {
        self.record(move || {
            let call = BackendCall::RemoveReaction {
                channel_id,
                message_id,
                emoji,
                user_id,
            };
            (call, ())
        })
    }

    fn clear_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
    ) -> BoxFuture<'static, BackendResult<()>> {
        self.record(move || {
            let call = BackendCall::ClearReaction {
                channel_id,
                message_id,
                emoji,
            };
            (call, ())
        })
    }

    fn clear_reactions(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> BoxFuture<'static, BackendResult<()>> {
        self.record(move || {
            let call = BackendCall::ClearReactions {
                channel_id,
                message_id,
            };
            (call, ())
        })
    }
}
