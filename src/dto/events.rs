//! DTO definitions for inbound gateway events.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::validate_emoji,
    state::react::{ChannelId, MessageId, UserId},
};

/// Whether a reaction appeared or disappeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    /// Reaction added.
    Add,
    /// Reaction removed.
    Remove,
}

/// A reaction event as delivered by the chat gateway.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ReactionEventRequest {
    /// Channel holding the message.
    #[validate(range(min = 1))]
    pub channel_id: ChannelId,
    /// Message reacted to.
    #[validate(range(min = 1))]
    pub message_id: MessageId,
    /// User who reacted.
    #[validate(range(min = 1))]
    pub user_id: UserId,
    /// Unicode emoji, or `name:id` for custom ones.
    #[validate(custom(function = "validate_emoji"))]
    pub emoji: String,
    /// Add or remove.
    pub kind: ReactionKind,
}

/// Whether the event was handed to a session.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReactionEventResponse {
    /// False when the event was dropped up front.
    pub accepted: bool,
}
