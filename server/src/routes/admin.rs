//! Admin endpoints: /health

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use log::debug;
use ontotag::ontology::SnapshotInfo;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    /// The published snapshot; absent until an ontology is loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ontology: Option<SnapshotInfo>,
}

/// GET /health
///
/// Never loads an ontology.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("health check requested");
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
        ontology: state.store.current().map(|s| s.info()),
    })
}
