//! Diff desired messages and reactions against what is on screen, then apply.
//!
//! Every decision is made before the first backend call. If anything fails
//! during planning, nothing has been sent.

use std::{collections::BTreeSet, fmt::Debug, hash::Hash};

use futures::{
    FutureExt,
    future::{BoxFuture, try_join_all},
};
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{
    backend::{BackendError, BackendResult, ChatBackend},
    state::{
        content::MessageContent,
        react::{ChannelId, MessageId, React, ReactSet, UserId, index_by_emoji},
    },
};

/// Failures surfaced by [`sync`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// A backend call failed. On-screen state may be partially updated.
    #[error("backend call failed")]
    Backend(#[from] BackendError),
    /// Message ids and applied content disagree on the set of keys.
    #[error("message id map and applied content have different keys")]
    KeyMismatch,
    /// Only the bot can add reactions.
    #[error("cannot add reaction {emoji} on behalf of user {user_id}")]
    ForeignReaction { user_id: UserId, emoji: String },
}

/// Where a desired key's message id comes from.
#[derive(Debug, Clone, Copy)]
enum Source {
    Existing(MessageId),
    /// Index into the list of messages to send.
    Send(usize),
}

/// A reaction removal against the main message.
#[derive(Debug)]
enum Removal {
    All,
    Emoji(String),
    User(String, UserId),
}

/// Bring the channel from `current_content` to `desired_content`.
///
/// Existing messages are reused in four passes, each applied to every
/// remaining key before the next starts: unchanged content under the same
/// key, identical content under another key, an edit in place, and finally a
/// new message. Messages left unclaimed are deleted.
///
/// Reactions are reconciled only on the message at position 0 of
/// `desired_content`. When that message isn't the one previously at position
/// 0, `current_reacts` no longer describes it and is ignored.
///
/// Returns the new key to message id mapping, in `desired_content` order.
pub async fn sync<K>(
    backend: &dyn ChatBackend,
    channel_id: ChannelId,
    current_map: &IndexMap<K, MessageId>,
    current_content: &IndexMap<K, MessageContent>,
    desired_content: &IndexMap<K, MessageContent>,
    current_reacts: &ReactSet,
    desired_reacts: &ReactSet,
) -> Result<IndexMap<K, MessageId>, SyncError>
where
    K: Clone + Eq + Hash + Debug,
{
    if current_map.len() != current_content.len()
        || !current_map.keys().all(|key| current_content.contains_key(key))
    {
        error!(channel_id, "message id map out of step with applied content");
        return Err(SyncError::KeyMismatch);
    }

    let mut free: IndexMap<&K, MessageId> =
        current_map.iter().map(|(key, id)| (key, *id)).collect();
    let mut sources: IndexMap<&K, Source> = IndexMap::new();
    let mut edits: Vec<(MessageId, MessageContent)> = Vec::new();
    let mut sends: Vec<&MessageContent> = Vec::new();

    let mut unmapped: Vec<(&K, &MessageContent)> = desired_content.iter().collect();

    // same key, same content
    unmapped.retain(|&(key, wanted)| {
        let unchanged = free.contains_key(key) && current_content.get(key) == Some(wanted);
        if unchanged {
            if let Some(id) = free.shift_remove(key) {
                debug!(channel_id, key = ?key, message_id = id, "reused unchanged");
                sources.insert(key, Source::Existing(id));
                return false;
            }
        }
        true
    });

    // other key, same content; prefer keys nothing else wants to edit
    unmapped.retain(|&(key, wanted)| {
        let candidates: Vec<&K> = free
            .keys()
            .copied()
            .filter(|candidate| current_content.get(*candidate) == Some(wanted))
            .collect();
        let chosen = candidates
            .iter()
            .find(|candidate| !desired_content.contains_key(**candidate))
            .or_else(|| candidates.first())
            .copied();
        match chosen.and_then(|candidate| free.shift_remove(candidate).map(|id| (candidate, id))) {
            Some((from, id)) => {
                debug!(channel_id, from = ?from, key = ?key, message_id = id, "remapped");
                sources.insert(key, Source::Existing(id));
                false
            }
            None => true,
        }
    });

    // same key, new content
    unmapped.retain(|&(key, wanted)| match free.shift_remove(key) {
        Some(id) => {
            debug!(channel_id, key = ?key, message_id = id, content = wanted.summary(), "editing");
            edits.push((id, wanted.clone()));
            sources.insert(key, Source::Existing(id));
            false
        }
        None => true,
    });

    for (key, wanted) in unmapped {
        debug!(channel_id, key = ?key, content = wanted.summary(), "sending");
        sources.insert(key, Source::Send(sends.len()));
        sends.push(wanted);
    }

    let deletes: Vec<MessageId> = free.values().copied().collect();
    for (key, id) in &free {
        debug!(channel_id, key = ?key, message_id = id, "deleting");
    }

    // reactions only follow the main message while its identity is unchanged
    let old_main = current_map.first().map(|(_, id)| *id);
    let new_main = desired_content
        .keys()
        .next()
        .and_then(|key| sources.get(key))
        .copied();
    let continuous = matches!(
        (new_main, old_main),
        (Some(Source::Existing(new)), Some(old)) if new == old
    );
    let empty = ReactSet::new();
    let old_reacts = if continuous { current_reacts } else { &empty };

    let adds: BTreeSet<&React> = desired_reacts.difference(old_reacts).collect();
    let bot_id = backend.bot_id();
    if let Some(foreign) = adds.iter().find(|react| react.user_id != bot_id) {
        error!(channel_id, user_id = foreign.user_id, emoji = %foreign.emoji, "refusing to react for another user");
        return Err(SyncError::ForeignReaction {
            user_id: foreign.user_id,
            emoji: foreign.emoji.clone(),
        });
    }
    let adds: Vec<String> = adds.into_iter().map(|react| react.emoji.clone()).collect();

    let removed: ReactSet = old_reacts.difference(desired_reacts).cloned().collect();
    let removals = plan_removals(&removed, desired_reacts);

    // execute
    let mut work: Vec<BoxFuture<'_, BackendResult<()>>> = Vec::new();
    for (id, content) in edits {
        work.push(backend.edit_message(channel_id, id, content));
    }
    for id in deletes {
        work.push(backend.delete_message(channel_id, id));
    }
    if let Some(main_id) = old_main.filter(|_| continuous) {
        for removal in removals {
            work.push(match removal {
                Removal::All => backend.clear_reactions(channel_id, main_id),
                Removal::Emoji(emoji) => backend.clear_reaction(channel_id, main_id, emoji),
                Removal::User(emoji, user_id) => {
                    backend.remove_reaction(channel_id, main_id, emoji, user_id)
                }
            });
        }
    }

    let mut main_adds = Some(adds);
    match new_main {
        Some(Source::Existing(main_id)) => {
            if let Some(adds) = main_adds.take().filter(|adds| !adds.is_empty()) {
                work.push(add_reactions(backend, channel_id, main_id, adds));
            }
        }
        Some(Source::Send(_)) => {}
        None => {
            if main_adds.as_ref().is_some_and(|adds| !adds.is_empty()) {
                warn!(channel_id, "no main message to react to");
            }
        }
    }

    let mut sent: Vec<BoxFuture<'_, BackendResult<MessageId>>> = Vec::with_capacity(sends.len());
    for (index, content) in sends.into_iter().enumerate() {
        let send = backend.send_message(channel_id, content.clone());
        let adds = match new_main {
            Some(Source::Send(main)) if main == index => main_adds.take().unwrap_or_default(),
            _ => Vec::new(),
        };
        sent.push(
            async move {
                let id = send.await?;
                add_reactions(backend, channel_id, id, adds).await?;
                Ok::<_, BackendError>(id)
            }
            .boxed(),
        );
    }

    let (ids, _) = futures::try_join!(try_join_all(sent), try_join_all(work))?;

    let mut next = IndexMap::with_capacity(desired_content.len());
    for key in desired_content.keys() {
        let id = match sources.get(key) {
            Some(Source::Existing(id)) => *id,
            Some(Source::Send(index)) => ids[*index],
            None => continue,
        };
        next.insert(key.clone(), id);
    }
    Ok(next)
}

/// Add `emojis` as the bot, one after another so they appear in order.
fn add_reactions<'a>(
    backend: &'a dyn ChatBackend,
    channel_id: ChannelId,
    message_id: MessageId,
    emojis: Vec<String>,
) -> BoxFuture<'a, BackendResult<()>> {
    async move {
        for emoji in emojis {
            backend.add_reaction(channel_id, message_id, emoji).await?;
        }
        Ok(())
    }
    .boxed()
}

/// Group removals into as few calls as possible without clearing more than needed.
fn plan_removals(removed: &ReactSet, desired: &ReactSet) -> Vec<Removal> {
    if removed.is_empty() {
        return Vec::new();
    }
    let by_emoji = index_by_emoji(removed);
    if desired.is_empty() && by_emoji.len() > 1 {
        return vec![Removal::All];
    }

    let kept: BTreeSet<&str> = desired.iter().map(|react| react.emoji.as_str()).collect();
    let mut removals = Vec::new();
    for (emoji, reacts) in by_emoji {
        if !kept.contains(emoji) && reacts.len() > 1 {
            removals.push(Removal::Emoji(emoji.to_owned()));
        } else {
            removals.extend(
                reacts
                    .into_iter()
                    .map(|react| Removal::User(react.emoji.clone(), react.user_id)),
            );
        }
    }
    removals
}
