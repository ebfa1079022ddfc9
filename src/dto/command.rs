//! DTO definitions for the command endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::state::react::{ChannelId, UserId};

/// A command issued by a user in a channel.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CommandRequest {
    /// Channel the PUG runs in.
    #[validate(range(min = 1))]
    pub channel_id: ChannelId,
    /// User who issued the command.
    #[validate(range(min = 1))]
    pub user_id: UserId,
}

/// Request to drop every session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ResetRequest {
    /// User who issued the command; must be the bot owner.
    #[validate(range(min = 1))]
    pub user_id: UserId,
}

/// Outcome of a command against one channel.
#[derive(Debug, Serialize, ToSchema)]
pub struct CommandResponse {
    /// Channel the command applied to.
    pub channel_id: ChannelId,
    /// Phase after the command's update chain settled.
    pub phase: String,
}

/// Outcome of a reset.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResetResponse {
    /// Sessions that were dropped.
    pub cleared: usize,
}

/// Debug view of one channel session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatus {
    /// Channel the session renders into.
    pub channel_id: ChannelId,
    /// Current phase name.
    pub phase: String,
    /// Id of the tracked main message, if any.
    pub main_message_id: Option<u64>,
    /// Messages the bot currently owns in the channel.
    pub messages: usize,
    /// Reactions tracked on the main message.
    pub reacts: usize,
}

/// Debug dump of every session.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// One entry per session, in channel id order.
    pub sessions: Vec<SessionStatus>,
    /// Human-readable `channel_id | phase` lines.
    pub summary: String,
}
