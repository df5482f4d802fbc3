//! Dashboard page routes
//!
//! Form posts update the session and redirect back to `/`, which always
//! renders a fresh recomputation. Errors are shown inside the dashboard
//! frame rather than as JSON.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use nest_common::Tier;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error};

use crate::api::simulation::{parse_tier, require_category, session_simulation, validate_amount};
use crate::error::{ApiError, ApiResult};
use crate::session::{Page, SessionId};
use crate::views;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NavigateForm {
    pub page: String,
}

/// Render an error inside the dashboard frame with the error's status
fn error_response(error: ApiError, page: Page, username: Option<&str>) -> Response {
    if let ApiError::Internal(ref msg) = error {
        error!("Page render failed: {}", msg);
    }
    (
        error.status(),
        Html(views::error_page(page, username, &error.to_string())),
    )
        .into_response()
}

/// GET /
///
/// Renders the session's active page.
pub async fn serve_dashboard(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> Response {
    let Some(session) = state.sessions.get(session_id).await else {
        return Redirect::to("/login").into_response();
    };
    let username = session.username.as_deref();

    match session.page {
        Page::SimulationBudget => match session_simulation(&state, session_id).await {
            Ok((simulation, table)) => {
                Html(views::simulation_page(&simulation, table.categories(), username))
                    .into_response()
            }
            Err(e) => error_response(e, session.page, username),
        },
        other => Html(views::placeholder_page(other, username)).into_response(),
    }
}

/// POST /navigate
pub async fn navigate(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    Form(form): Form<NavigateForm>,
) -> Response {
    let Some(page) = Page::from_slug(&form.page) else {
        let username = state
            .sessions
            .get(session_id)
            .await
            .and_then(|s| s.username);
        return error_response(
            ApiError::BadRequest(format!("Unknown page: {}", form.page)),
            Page::default(),
            username.as_deref(),
        );
    };

    state
        .sessions
        .update(session_id, |session| session.page = page)
        .await;
    debug!(session = %session_id, page = page.slug(), "Page changed");
    Redirect::to("/").into_response()
}

/// Parse one tier field; an emptied field counts as 0
fn parse_tier_field(tier: Tier, raw: &str) -> ApiResult<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    let amount: f64 = raw.parse().map_err(|_| {
        ApiError::BadRequest(format!("Budget for {} is not a number: {}", tier, raw))
    })?;
    validate_amount(tier, amount)
}

/// POST /simulation
///
/// Applies a category switch and any changed tier amounts. All fields are
/// validated before anything is applied.
pub async fn submit_simulation(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let username = state
        .sessions
        .get(session_id)
        .await
        .and_then(|s| s.username);

    match apply_simulation_form(&state, session_id, &fields).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => error_response(e, Page::SimulationBudget, username.as_deref()),
    }
}

async fn apply_simulation_form(
    state: &AppState,
    session_id: SessionId,
    fields: &HashMap<String, String>,
) -> ApiResult<()> {
    let category = match fields.get("category") {
        Some(category) => {
            let table = state.weights_table().await?;
            require_category(&table, category)?;
            Some(category.clone())
        }
        None => None,
    };

    let mut edits = Vec::new();
    for name in views::tier_field_names() {
        if let Some(raw) = fields.get(name) {
            let tier = parse_tier(name)?;
            edits.push((tier, parse_tier_field(tier, raw)?));
        }
    }

    state
        .sessions
        .update(session_id, |session| {
            if let Some(category) = category {
                session.category = Some(category);
            }
            for (tier, amount) in edits {
                if session.inputs.get(tier) != amount {
                    debug!(session = %session_id, %tier, amount, "Tier budget updated");
                    session.inputs.set(tier, amount);
                }
            }
        })
        .await
        .ok_or(ApiError::Unauthorized)
}
