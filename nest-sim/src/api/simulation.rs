//! Simulation JSON API
//!
//! Every response is a full recomputation for the caller's session: the
//! weight mappings are re-derived from the cached table on each request, so
//! a category switch never sees another category's weights.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use nest_common::{simulate, Simulation, Tier, WeightsTable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::session::SessionId;
use crate::AppState;

/// Category list for the selector
#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
    pub selected: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct BudgetRequest {
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub location: String,
    pub rows: usize,
    pub categories: usize,
}

/// Reject budget amounts the input boundary does not accept
///
/// The aggregator itself takes any number; only finite, non-negative
/// amounts get past the HTTP boundary.
pub fn validate_amount(tier: Tier, amount: f64) -> ApiResult<f64> {
    if !amount.is_finite() {
        return Err(ApiError::BadRequest(format!(
            "Budget for {} must be a finite number",
            tier
        )));
    }
    if amount < 0.0 {
        return Err(ApiError::BadRequest(format!(
            "Budget for {} must not be negative (got {})",
            tier, amount
        )));
    }
    Ok(amount)
}

/// Parse a tier path/form name
pub fn parse_tier(name: &str) -> ApiResult<Tier> {
    Tier::from_name(name).ok_or_else(|| ApiError::BadRequest(format!("Unknown tier: {}", name)))
}

/// Check a requested category against the table
pub fn require_category(table: &WeightsTable, category: &str) -> ApiResult<()> {
    if table.has_category(category) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Unknown category: {}", category)))
    }
}

/// Recompute the session's simulation against the current weights table
///
/// Also repairs the session's category when it is unset or no longer in
/// the table.
pub async fn session_simulation(
    state: &AppState,
    session_id: SessionId,
) -> ApiResult<(Simulation, Arc<WeightsTable>)> {
    let table = state.weights_table().await?;

    let simulation = state
        .sessions
        .update(session_id, |session| {
            session
                .resolve_category(&table)
                .map(|category| simulate(&table, &category, &session.inputs))
        })
        .await
        .ok_or(ApiError::Unauthorized)?
        .ok_or_else(|| ApiError::DataSource("Weights table has no categories".to_string()))?;

    Ok((simulation, table))
}

/// GET /api/categories
pub async fn get_categories(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> ApiResult<Json<CategoriesResponse>> {
    let (simulation, table) = session_simulation(&state, session_id).await?;
    Ok(Json(CategoriesResponse {
        categories: table.categories().to_vec(),
        selected: simulation.category,
    }))
}

/// GET /api/simulation
pub async fn get_simulation(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> ApiResult<Json<Simulation>> {
    let (simulation, _) = session_simulation(&state, session_id).await?;
    Ok(Json(simulation))
}

/// PUT /api/simulation/category
pub async fn put_category(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    Json(request): Json<CategoryRequest>,
) -> ApiResult<Json<Simulation>> {
    let table = state.weights_table().await?;
    require_category(&table, &request.category)?;

    state
        .sessions
        .update(session_id, |session| {
            session.category = Some(request.category.clone())
        })
        .await
        .ok_or(ApiError::Unauthorized)?;
    debug!(session = %session_id, category = %request.category, "Category selected");

    let (simulation, _) = session_simulation(&state, session_id).await?;
    Ok(Json(simulation))
}

/// PUT /api/simulation/budget/:tier
pub async fn put_tier_budget(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    Path(tier_name): Path<String>,
    Json(request): Json<BudgetRequest>,
) -> ApiResult<Json<Simulation>> {
    let tier = parse_tier(&tier_name)?;
    let amount = validate_amount(tier, request.amount)?;

    state
        .sessions
        .update(session_id, |session| session.inputs.set(tier, amount))
        .await
        .ok_or(ApiError::Unauthorized)?;
    debug!(session = %session_id, %tier, amount, "Tier budget updated");

    let (simulation, _) = session_simulation(&state, session_id).await?;
    Ok(Json(simulation))
}

/// POST /api/weights/refresh
///
/// Drops the cached table for the configured location and fetches it again.
pub async fn refresh_weights(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    state.weights.invalidate(&state.weights_url).await;
    let table = state.weights_table().await?;
    info!(location = %state.weights_url, rows = table.len(), "Weights table refreshed");

    Ok(Json(RefreshResponse {
        location: state.weights_url.to_string(),
        rows: table.len(),
        categories: table.categories().len(),
    }))
}
