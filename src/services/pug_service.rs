//! Commands and gateway events, translated into session updates.

use tracing::{info, trace, warn};

use crate::{
    dto::{
        command::{CommandResponse, ResetResponse, SessionStatus, StatusResponse},
        events::{ReactionEventRequest, ReactionEventResponse, ReactionKind},
    },
    error::ServiceError,
    services::scheduler::{self, ReactEvent},
    state::{
        SharedState,
        react::{ChannelId, React, UserId},
        session::ChannelSession,
        snapshot::{Phase, Snapshot},
    },
};

/// Start a PUG in `channel_id`, making `user_id` an admin of it.
pub async fn start(
    state: &SharedState,
    channel_id: ChannelId,
    user_id: UserId,
) -> Result<CommandResponse, ServiceError> {
    let existing = state.session(channel_id);
    if let Some(session) = &existing
        && session.snapshot().await.phase != Phase::Stopped
    {
        return Err(ServiceError::AlreadyRunning(channel_id));
    }

    // installed already started, so a concurrent start sees it as running
    let started = state.stopped_snapshot().start(user_id);
    let session = state
        .replace_session(channel_id, existing.as_ref(), started)
        .ok_or(ServiceError::AlreadyRunning(channel_id))?;
    scheduler::update_state(state.backend().as_ref(), &session, |snapshot| {
        snapshot.clone()
    })
    .await?;
    info!(channel_id, user_id, "PUG started");
    Ok(respond(&session).await)
}

/// Stop the PUG in `channel_id`. Only its admins may do so.
pub async fn stop(
    state: &SharedState,
    channel_id: ChannelId,
    user_id: UserId,
) -> Result<CommandResponse, ServiceError> {
    let session = state
        .session(channel_id)
        .ok_or(ServiceError::NotRunning(channel_id))?;
    let snapshot = session.snapshot().await;
    if snapshot.phase == Phase::Stopped {
        return Err(ServiceError::NotRunning(channel_id));
    }
    if !snapshot.admin_ids.contains(&user_id) {
        return Err(ServiceError::Unauthorized(
            "only PUG admins can stop it".into(),
        ));
    }

    scheduler::update_state(state.backend().as_ref(), &session, Snapshot::stop).await?;
    info!(channel_id, user_id, "PUG stopped");
    Ok(respond(&session).await)
}

/// Re-render the current snapshot of `channel_id` in the background. Owner only.
pub async fn poke(
    state: &SharedState,
    channel_id: ChannelId,
    user_id: UserId,
) -> Result<CommandResponse, ServiceError> {
    require_owner(state, user_id)?;
    let session = state
        .session(channel_id)
        .ok_or(ServiceError::NotRunning(channel_id))?;

    let response = respond(&session).await;
    let backend = state.backend().clone();
    tokio::spawn(async move {
        if let Err(err) =
            scheduler::update_state(backend.as_ref(), &session, |snapshot| snapshot.clone()).await
        {
            warn!(channel_id, error = ?err, "poke failed");
        }
    });
    info!(channel_id, "poked");
    Ok(response)
}

/// Debug view of every session.
pub async fn status(state: &SharedState) -> StatusResponse {
    let mut sessions = Vec::new();
    for session in state.sessions() {
        let inner = session.lock().await;
        sessions.push(SessionStatus {
            channel_id: session.channel_id(),
            phase: inner.state.phase.name().to_owned(),
            main_message_id: inner.main_message_id(),
            messages: inner.msg_id_map.len(),
            reacts: inner.reacts.len(),
        });
    }

    let summary = if sessions.is_empty() {
        "Not active in any channels.".to_owned()
    } else {
        sessions
            .iter()
            .map(|session| format!("{} | {}", session.channel_id, session.phase))
            .collect::<Vec<_>>()
            .join("\n")
    };
    StatusResponse { sessions, summary }
}

/// Forget every session. Owner only.
pub async fn reset(state: &SharedState, user_id: UserId) -> Result<ResetResponse, ServiceError> {
    require_owner(state, user_id)?;
    let cleared = state.clear_sessions();
    info!(cleared, "sessions reset");
    Ok(ResetResponse { cleared })
}

/// Feed a gateway reaction event to its channel's session.
///
/// Events from the bot itself or for channels without an active PUG are
/// dropped. Accepted events are applied in the background; failures there are
/// logged and left for the next update to correct.
pub async fn reaction_event(
    state: &SharedState,
    event: ReactionEventRequest,
) -> ReactionEventResponse {
    let ReactionEventRequest {
        channel_id,
        message_id,
        user_id,
        emoji,
        kind,
    } = event;

    if user_id == state.bot_id() {
        trace!(channel_id, message_id, "ignoring own reaction");
        return ReactionEventResponse { accepted: false };
    }
    let Some(session) = state.session(channel_id) else {
        trace!(channel_id, "ignoring reaction outside any session");
        return ReactionEventResponse { accepted: false };
    };
    if session.snapshot().await.phase == Phase::Stopped {
        trace!(channel_id, message_id, "ignoring reaction on a stopped PUG");
        return ReactionEventResponse { accepted: false };
    }

    let react = React::new(user_id, emoji);
    let event = match kind {
        ReactionKind::Add => ReactEvent::Added(react),
        ReactionKind::Remove => ReactEvent::Removed(react),
    };
    let backend = state.backend().clone();
    tokio::spawn(async move {
        match scheduler::update_reacts(backend.as_ref(), &session, message_id, event).await {
            Ok(applied) => trace!(channel_id, message_id, applied, "reaction processed"),
            Err(err) => warn!(channel_id, error = ?err, "update after reaction failed"),
        }
    });
    ReactionEventResponse { accepted: true }
}

fn require_owner(state: &SharedState, user_id: UserId) -> Result<(), ServiceError> {
    if state.is_owner(user_id) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(
            "only the bot owner can do that".into(),
        ))
    }
}

async fn respond(session: &ChannelSession) -> CommandResponse {
    CommandResponse {
        channel_id: session.channel_id(),
        phase: session.snapshot().await.phase.name().to_owned(),
    }
}
