//! Liveness probe for the simulation dashboard
//!
//! Answers without a session cookie and without fetching the weights
//! table, so it stays green while the spreadsheet export is unreachable.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Liveness body reported by nest-sim
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "nest-sim".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Sessionless routes merged into the public router
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_service_and_version() {
        let Json(health) = health_check().await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.module, "nest-sim");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }
}
