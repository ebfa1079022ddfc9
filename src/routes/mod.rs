use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::SharedState};

/// PUG command routes.
pub mod commands;
/// OpenAPI document and Swagger UI.
pub mod docs;
/// Gateway event routes.
pub mod events;
/// Health check route.
pub mod health;

const CONTROL_TOKEN_HEADER: &str = "x-control-token";

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(commands::router(state.clone()))
        .merge(events::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

/// Reject requests lacking the configured control token. Open when none is configured.
async fn require_control_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config().control_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get(CONTROL_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing control token header `X-Control-Token`".into())
        })?;

    if provided == expected {
        Ok(next.run(req).await)
    } else {
        Err(AppError::Unauthorized("invalid control token".into()))
    }
}
