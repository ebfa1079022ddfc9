use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the PUG bot control plane.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::commands::start,
        crate::routes::commands::stop,
        crate::routes::commands::poke,
        crate::routes::commands::reset,
        crate::routes::commands::status,
        crate::routes::events::reaction,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::command::CommandRequest,
            crate::dto::command::CommandResponse,
            crate::dto::command::ResetRequest,
            crate::dto::command::ResetResponse,
            crate::dto::command::SessionStatus,
            crate::dto::command::StatusResponse,
            crate::dto::events::ReactionKind,
            crate::dto::events::ReactionEventRequest,
            crate::dto::events::ReactionEventResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "commands", description = "PUG commands issued on behalf of chat users"),
        (name = "events", description = "Chat gateway events"),
    )
)]
pub struct ApiDoc;
