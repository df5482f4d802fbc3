//! nest-sim library - Simulation Budget dashboard
//!
//! Login-gated web UI and JSON API that project influencer KPI totals
//! (impressions, views, engagement) from per-tier budgets and a weights
//! table fetched from a remote spreadsheet export.

use axum::Router;
use nest_common::{CredentialVerifier, WeightsTable};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod session;
pub mod views;
pub mod weights_cache;

pub use crate::error::{ApiError, ApiResult};
pub use crate::session::{Page, SessionContext, SessionId, SessionStore};
pub use crate::weights_cache::{LocationSource, WeightsCache, WeightsSource};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live browser sessions
    pub sessions: SessionStore,
    /// Parsed weights tables keyed by source location
    pub weights: WeightsCache,
    /// Location of the weights table this service simulates against
    pub weights_url: Arc<str>,
    /// Login check
    pub credentials: Arc<dyn CredentialVerifier>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        weights_url: impl Into<String>,
        weights: WeightsCache,
        credentials: Arc<dyn CredentialVerifier>,
    ) -> Self {
        let weights_url: String = weights_url.into();
        Self {
            sessions: SessionStore::new(),
            weights,
            weights_url: Arc::from(weights_url),
            credentials,
        }
    }

    /// Weights table for the configured location (cached after first fetch)
    pub async fn weights_table(&self) -> nest_common::Result<Arc<WeightsTable>> {
        self.weights.get_or_fetch(&self.weights_url).await
    }
}

/// Build application router
///
/// Health and build info are public and sessionless. Everything else runs
/// inside the session middleware; pages and the JSON API additionally
/// require an authenticated session.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    // JSON API (401 without login)
    let protected_api = Router::new()
        .route("/api/categories", get(api::get_categories))
        .route("/api/simulation", get(api::get_simulation))
        .route("/api/simulation/category", put(api::put_category))
        .route("/api/simulation/budget/:tier", put(api::put_tier_budget))
        .route("/api/weights/refresh", post(api::refresh_weights))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_api_session,
        ));

    // HTML pages (redirect to /login without login)
    let protected_pages = Router::new()
        .route("/", get(api::serve_dashboard))
        .route("/navigate", post(api::navigate))
        .route("/simulation", post(api::submit_simulation))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_page_session,
        ));

    let sessioned = Router::new()
        .merge(protected_api)
        .merge(protected_pages)
        .route("/login", get(api::serve_login).post(api::login))
        .route("/logout", post(api::logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ));

    // Public routes (no session)
    let public = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(sessioned)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
