use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "dry-run").
    pub status: String,
    /// Channels with a session, running or not.
    pub sessions: usize,
}

impl HealthResponse {
    /// Healthy, talking to a real chat service.
    pub fn ok(sessions: usize) -> Self {
        Self {
            status: "ok".to_string(),
            sessions,
        }
    }

    /// Healthy, but rendering into the in-memory backend.
    pub fn dry_run(sessions: usize) -> Self {
        Self {
            status: "dry-run".to_string(),
            sessions,
        }
    }
}
