//! Reaction values and the emoji vocabulary shared by every PUG phase.

use std::collections::{BTreeMap, BTreeSet};

/// Discord user snowflake.
pub type UserId = u64;
/// Discord channel snowflake.
pub type ChannelId = u64;
/// Discord message snowflake.
pub type MessageId = u64;

/// Emoji used by admins to keep a PUG from advancing.
pub const WAIT_EMOJI: &str = "\u{23F8}\u{FE0F}";
/// Emoji used by admins to force a PUG forward.
pub const SKIP_EMOJI: &str = "\u{23E9}";
/// Sign up as a host.
pub const HOST_EMOJI: &str = "\u{1F310}";
/// Sign up as a captain.
pub const CAPT_EMOJI: &str = "\u{1F9E2}";
/// Marks a running game as finished.
pub const DONE_EMOJI: &str = "\u{2705}";
/// Fallback player emoji shown before anyone has reacted to play.
pub const LAPTOP_MAN: &str = "\u{1F468}\u{200D}\u{1F4BB}";

/// A single `(user, emoji)` reaction on the tracked main message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct React {
    /// User who reacted.
    pub user_id: UserId,
    /// Unicode emoji, or `name:id` for custom emoji.
    pub emoji: String,
}

impl React {
    /// Build a reaction from any string-like emoji.
    pub fn new(user_id: UserId, emoji: impl Into<String>) -> Self {
        Self {
            user_id,
            emoji: emoji.into(),
        }
    }
}

/// Unordered, duplicate-free set of reactions.
///
/// Backed by a `BTreeSet` so iteration (and therefore the order reactions get
/// added to Discord) is deterministic.
pub type ReactSet = BTreeSet<React>;

/// Group reactions by emoji.
pub fn index_by_emoji<'a>(
    reacts: impl IntoIterator<Item = &'a React>,
) -> BTreeMap<&'a str, BTreeSet<&'a React>> {
    let mut index: BTreeMap<&str, BTreeSet<&React>> = BTreeMap::new();
    for react in reacts {
        index.entry(react.emoji.as_str()).or_default().insert(react);
    }
    index
}

/// Build the set of reactions `user_id` places with each of `emojis`.
#[cfg(test)]
pub(crate) fn reacts_from<'a>(user_id: UserId, emojis: impl IntoIterator<Item = &'a str>) -> ReactSet {
    emojis
        .into_iter()
        .map(|emoji| React::new(user_id, emoji))
        .collect()
}

/// Discord mention markup for a user.
pub fn mention(user_id: UserId) -> String {
    format!("<@{user_id}>")
}

/// 64-bit FNV-1a hash, used to seed stable emoji shuffles.
///
/// Unlike `std`'s hasher the output is fixed across toolchains and runs.
pub fn stable_hash<I, T>(parts: I) -> u64
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for part in parts {
        for byte in part.as_ref() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(PRIME);
        }
        // separator so ["ab", "c"] and ["a", "bc"] differ
        hash ^= 0xff;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_by_emoji_groups_users() {
        let reacts: ReactSet = [React::new(1, "x"), React::new(2, "x"), React::new(1, "y")].into();
        let index = index_by_emoji(&reacts);
        assert_eq!(index["x"].len(), 2);
        assert_eq!(index["y"].len(), 1);
    }

    #[test]
    fn stable_hash_is_order_and_boundary_sensitive() {
        assert_eq!(stable_hash(["1", "2"]), stable_hash(["1", "2"]));
        assert_ne!(stable_hash(["1", "2"]), stable_hash(["2", "1"]));
        assert_ne!(stable_hash(["ab", "c"]), stable_hash(["a", "bc"]));
    }
}
