//! Login gate
//!
//! Credentials are checked through the injected `CredentialVerifier`; a
//! successful login marks the session authenticated until logout. Failed
//! attempts only re-render the form (no lockout).

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::session::{expired_session_cookie, SessionId};
use crate::views;
use crate::AppState;

/// Message shown after a rejected login
pub const LOGIN_FAILED_MESSAGE: &str = "Incorrect username or password. Please try again.";

/// Login form fields
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// JSON API guard: 401 unless the session is authenticated
pub async fn require_api_session(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.sessions.is_authenticated(session_id).await {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}

/// Page guard: redirect to the login form unless authenticated
pub async fn require_page_session(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    request: Request,
    next: Next,
) -> Response {
    if !state.sessions.is_authenticated(session_id).await {
        return Redirect::to("/login").into_response();
    }
    next.run(request).await
}

/// GET /login
pub async fn serve_login(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> Response {
    if state.sessions.is_authenticated(session_id).await {
        return Redirect::to("/").into_response();
    }
    Html(views::login_page(None)).into_response()
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    Form(form): Form<LoginForm>,
) -> Response {
    if state.credentials.verify(&form.username, &form.password) {
        state.sessions.login(session_id, &form.username).await;
        info!(username = %form.username, session = %session_id, "✓ Login successful");
        Redirect::to("/").into_response()
    } else {
        warn!(username = %form.username, "Login rejected");
        (
            StatusCode::UNAUTHORIZED,
            Html(views::login_page(Some(LOGIN_FAILED_MESSAGE))),
        )
            .into_response()
    }
}

/// POST /logout
///
/// Ends the session (dropping its budget inputs) and clears the cookie.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> Response {
    state.sessions.end(session_id).await;
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}
