use axum::{
    Json, Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::command::{CommandRequest, CommandResponse, ResetRequest, ResetResponse, StatusResponse},
    error::AppError,
    routes::require_control_token,
    services::pug_service,
    state::SharedState,
};

/// Command endpoints standing in for the chat command parser.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/commands/start", post(start))
        .route("/commands/stop", post(stop))
        .route("/commands/poke", post(poke))
        .route("/commands/reset", post(reset))
        .route("/status", get(status))
        .route_layer(middleware::from_fn_with_state(state, require_control_token))
}

/// Start a PUG in a channel; the caller becomes one of its admins.
#[utoipa::path(
    post,
    path = "/commands/start",
    tag = "commands",
    params(("X-Control-Token" = Option<String>, Header, description = "Shared control-plane secret, when configured")),
    request_body = CommandRequest,
    responses(
        (status = 200, description = "PUG started", body = CommandResponse),
        (status = 409, description = "Already running in the channel"),
    )
)]
pub async fn start(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CommandRequest>>,
) -> Result<Json<CommandResponse>, AppError> {
    Ok(Json(
        pug_service::start(&state, payload.channel_id, payload.user_id).await?,
    ))
}

/// Stop the PUG in a channel, keeping its history on screen.
#[utoipa::path(
    post,
    path = "/commands/stop",
    tag = "commands",
    params(("X-Control-Token" = Option<String>, Header, description = "Shared control-plane secret, when configured")),
    request_body = CommandRequest,
    responses(
        (status = 200, description = "PUG stopped", body = CommandResponse),
        (status = 401, description = "Caller is not an admin of the PUG"),
        (status = 409, description = "Not running in the channel"),
    )
)]
pub async fn stop(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CommandRequest>>,
) -> Result<Json<CommandResponse>, AppError> {
    Ok(Json(
        pug_service::stop(&state, payload.channel_id, payload.user_id).await?,
    ))
}

/// Re-render a channel's current state. Owner only.
#[utoipa::path(
    post,
    path = "/commands/poke",
    tag = "commands",
    params(("X-Control-Token" = Option<String>, Header, description = "Shared control-plane secret, when configured")),
    request_body = CommandRequest,
    responses(
        (status = 200, description = "Re-render scheduled", body = CommandResponse),
        (status = 401, description = "Caller is not the bot owner"),
        (status = 409, description = "No session in the channel"),
    )
)]
pub async fn poke(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CommandRequest>>,
) -> Result<Json<CommandResponse>, AppError> {
    Ok(Json(
        pug_service::poke(&state, payload.channel_id, payload.user_id).await?,
    ))
}

/// Drop every session. Owner only.
#[utoipa::path(
    post,
    path = "/commands/reset",
    tag = "commands",
    params(("X-Control-Token" = Option<String>, Header, description = "Shared control-plane secret, when configured")),
    request_body = ResetRequest,
    responses(
        (status = 200, description = "Sessions dropped", body = ResetResponse),
        (status = 401, description = "Caller is not the bot owner"),
    )
)]
pub async fn reset(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ResetRequest>>,
) -> Result<Json<ResetResponse>, AppError> {
    Ok(Json(pug_service::reset(&state, payload.user_id).await?))
}

/// Debug dump of every channel session.
#[utoipa::path(
    get,
    path = "/status",
    tag = "commands",
    params(("X-Control-Token" = Option<String>, Header, description = "Shared control-plane secret, when configured")),
    responses((status = 200, description = "Session overview", body = StatusResponse))
)]
pub async fn status(State(state): State<SharedState>) -> Json<StatusResponse> {
    Json(pug_service::status(&state).await)
}
