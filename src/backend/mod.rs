//! Messaging backends the reconciler talks to.

/// Discord REST backend.
#[cfg(feature = "discord-http")]
pub mod discord;
/// Error type shared by every backend.
pub mod error;
/// In-memory backend used for dry runs and tests.
pub mod memory;

use futures::future::BoxFuture;

use crate::state::{
    content::MessageContent,
    react::{ChannelId, MessageId, UserId},
};

pub use self::error::{BackendError, BackendResult};
pub use self::memory::{BackendCall, RecordingBackend};

/// Abstraction over the chat service the PUG is rendered into.
///
/// Calls are independent: the reconciler may issue many of them concurrently.
pub trait ChatBackend: Send + Sync {
    /// User id the backend acts as.
    fn bot_id(&self) -> UserId;
    /// Post a new message and return its id.
    fn send_message(
        &self,
        channel_id: ChannelId,
        content: MessageContent,
    ) -> BoxFuture<'static, BackendResult<MessageId>>;
    /// Replace a message's content in place.
    fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: MessageContent,
    ) -> BoxFuture<'static, BackendResult<()>>;
    /// Delete a message the bot posted.
    fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> BoxFuture<'static, BackendResult<()>>;
    /// React as the bot.
    fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
    ) -> BoxFuture<'static, BackendResult<()>>;
    /// Remove a single user's reaction; `user_id` may be the bot itself.
    fn remove_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
        user_id: UserId,
    ) -> BoxFuture<'static, BackendResult<()>>;
    /// Remove every reaction with `emoji`.
    fn clear_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
    ) -> BoxFuture<'static, BackendResult<()>>;
    /// Remove every reaction on the message.
    fn clear_reactions(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> BoxFuture<'static, BackendResult<()>>;
}
