//! Health check endpoint for liveness probes.
//!
//! Returns 200 OK if the server is running. Deliberately stateless: it does
//! not touch the rule store or the Graph API, so a Graph outage never makes
//! the orchestrator restart the service.

use axum::http::StatusCode;

/// Health check handler.
///
/// Returns 200 OK with the text "OK" to show the server is accepting
/// connections.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
