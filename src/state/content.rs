//! Displayable message payloads and the keyed collections the reconciler diffs.

use indexmap::IndexMap;
use serde::Serialize;

/// Zero-width space; Discord rejects empty embed field values.
pub const EMPTY: &str = "\u{200B}";

/// Logical identity of a rendered message.
///
/// Reuse decisions are made per key, not per position. Iteration position 0
/// of a [`DesiredMessages`] map is the "main" message whose reactions are
/// interpreted as game input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKey {
    /// The interactive message of the active phase.
    Main,
    /// A finalized payload kept visible from an earlier phase.
    History(usize),
    /// One-off ping sent after the history entry with the same index.
    Notify(usize),
}

/// Desired (or last applied) content keyed by logical message.
pub type DesiredMessages = IndexMap<MessageKey, MessageContent>;

/// Content of a single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageContent {
    /// Plain text body.
    Text(String),
    /// Single rich embed with no text body.
    Embed(Embed),
}

impl MessageContent {
    /// Short human-readable label used in logs.
    pub fn summary(&self) -> &str {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Embed(embed) => &embed.title,
        }
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        MessageContent::Text(value.to_owned())
    }
}

impl From<String> for MessageContent {
    fn from(value: String) -> Self {
        MessageContent::Text(value)
    }
}

impl From<Embed> for MessageContent {
    fn from(value: Embed) -> Self {
        MessageContent::Embed(value)
    }
}

/// Rich embed, serialized in Discord's wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Embed {
    /// Bold heading.
    pub title: String,
    /// Body text under the title.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Sidebar colour as `0xRRGGBB`.
    #[serde(rename = "color")]
    pub colour: u32,
    /// Name/value fields, in display order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    /// Small print at the bottom.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

/// One name/value field of an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EmbedField {
    /// Field heading.
    pub name: String,
    /// Field body.
    pub value: String,
    /// Whether the field may share a row with its neighbours.
    pub inline: bool,
}

/// Footer line of an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EmbedFooter {
    /// Footer text.
    pub text: String,
}

impl Embed {
    /// Start an embed with a title and colour.
    pub fn new(title: impl Into<String>, colour: u32) -> Self {
        Self {
            title: title.into(),
            colour,
            ..Self::default()
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append an inline field. Empty values are padded with [`EMPTY`].
    pub fn field(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_field(name.into(), value.into(), true)
    }

    /// Append a field that takes a full row.
    pub fn wide_field(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_field(name.into(), value.into(), false)
    }

    /// Set the footer text.
    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    fn push_field(mut self, name: String, value: String, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name,
            value: format!("{EMPTY}{value}"),
            inline,
        });
        self
    }
}

/// Render `history` under [`MessageKey::History`] keys, in order.
pub fn history_messages(history: &[MessageContent]) -> impl Iterator<Item = (MessageKey, MessageContent)> + '_ {
    history
        .iter()
        .enumerate()
        .map(|(index, content)| (MessageKey::History(index), content.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_serializes_in_discord_shape() {
        let embed = Embed::new("title", 0x00ff00)
            .field("a", "b")
            .footer("foot");
        let json = serde_json::to_value(&embed).unwrap();
        assert_eq!(json["color"], 0x00ff00);
        assert_eq!(json["fields"][0]["value"], format!("{EMPTY}b"));
        assert_eq!(json["footer"]["text"], "foot");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn history_keys_follow_positions() {
        let history = vec![MessageContent::from("a"), MessageContent::from("b")];
        let keys: Vec<_> = history_messages(&history).map(|(key, _)| key).collect();
        assert_eq!(keys, vec![MessageKey::History(0), MessageKey::History(1)]);
    }
}
