use serde::{Deserialize, Serialize};

use crate::state::content::{Embed, MessageContent};

/// Body of a message create or edit request.
///
/// Both fields are always sent so an edit replacing text with an embed (or
/// the other way round) clears the previous payload.
#[derive(Debug, Serialize)]
pub struct MessageBody<'a> {
    /// Plain text body; empty for embed messages.
    pub content: &'a str,
    /// Embeds; empty for text messages.
    pub embeds: Vec<&'a Embed>,
}

impl<'a> From<&'a MessageContent> for MessageBody<'a> {
    fn from(value: &'a MessageContent) -> Self {
        match value {
            MessageContent::Text(text) => Self {
                content: text,
                embeds: Vec::new(),
            },
            MessageContent::Embed(embed) => Self {
                content: "",
                embeds: vec![embed],
            },
        }
    }
}

/// Subset of a Discord message object the bot reads back.
#[derive(Debug, Deserialize)]
pub struct MessageObject {
    /// Message snowflake.
    pub id: String,
}

/// Subset of the `/users/@me` response.
#[derive(Debug, Deserialize)]
pub struct CurrentUser {
    /// User snowflake.
    pub id: String,
    /// Account name, logged at startup.
    #[serde(default)]
    pub username: String,
}
