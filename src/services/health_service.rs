use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness along with how many channels hold a session.
pub fn health_status(state: &SharedState) -> HealthResponse {
    let sessions = state.sessions().len();
    if state.is_dry_run() {
        HealthResponse::dry_run(sessions)
    } else {
        HealthResponse::ok(sessions)
    }
}
