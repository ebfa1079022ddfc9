use axum::{Json, Router, extract::State, middleware, routing::post};
use axum_valid::Valid;

use crate::{
    dto::events::{ReactionEventRequest, ReactionEventResponse},
    routes::require_control_token,
    services::pug_service,
    state::SharedState,
};

/// Inbound gateway events.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/events/reaction", post(reaction))
        .route_layer(middleware::from_fn_with_state(state, require_control_token))
}

/// Deliver a reaction add/remove observed on the chat service.
#[utoipa::path(
    post,
    path = "/events/reaction",
    tag = "events",
    params(("X-Control-Token" = Option<String>, Header, description = "Shared control-plane secret, when configured")),
    request_body = ReactionEventRequest,
    responses((status = 200, description = "Whether the event was handed to a session", body = ReactionEventResponse))
)]
pub async fn reaction(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ReactionEventRequest>>,
) -> Json<ReactionEventResponse> {
    Json(pug_service::reaction_event(&state, payload).await)
}
