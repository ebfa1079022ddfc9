//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest emoji name accepted; custom emoji are sent as `name:id`.
const MAX_EMOJI_LEN: usize = 64;

/// Validates that an emoji is a non-empty single token usable as a reaction.
///
/// # Examples
///
/// ```ignore
/// validate_emoji("\u{2705}")          // Ok
/// validate_emoji("pug:123456789")     // Ok - custom emoji
/// validate_emoji("")                  // Err - empty
/// validate_emoji("two words")         // Err - whitespace
/// ```
pub fn validate_emoji(emoji: &str) -> Result<(), ValidationError> {
    if emoji.is_empty() || emoji.len() > MAX_EMOJI_LEN {
        let mut err = ValidationError::new("emoji_length");
        err.message = Some(
            format!(
                "Emoji must be between 1 and {MAX_EMOJI_LEN} bytes (got {})",
                emoji.len()
            )
            .into(),
        );
        return Err(err);
    }

    if emoji.chars().any(|c| c.is_whitespace() || c == '/') {
        let mut err = ValidationError::new("emoji_format");
        err.message = Some("Emoji must not contain whitespace or slashes".into());
        return Err(err);
    }

    Ok(())
}
