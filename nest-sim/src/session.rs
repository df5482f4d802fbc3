//! Per-browser session contexts
//!
//! A session is stored at login and ends at logout. Anonymous requests get a
//! candidate id that is never stored, so unauthenticated traffic leaves the
//! store untouched. Each `SessionContext` owns everything the
//! pages read and write: the authenticated flag, the budget inputs, the
//! selected category and the active page. Nothing is shared between
//! sessions and nothing outlives the process.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use nest_common::{BudgetInputs, WeightsTable};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AppState;

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "nest_session";

/// Session identifier (random v4 UUID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Dashboard navigation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    #[default]
    SimulationBudget,
    InfluencerPerformance,
    OptimizedBudget,
    GenAi,
    Dashboard,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::SimulationBudget,
        Page::InfluencerPerformance,
        Page::OptimizedBudget,
        Page::GenAi,
        Page::Dashboard,
    ];

    /// Form / URL identifier
    pub fn slug(&self) -> &'static str {
        match self {
            Page::SimulationBudget => "simulation-budget",
            Page::InfluencerPerformance => "influencer-performance",
            Page::OptimizedBudget => "optimized-budget",
            Page::GenAi => "gen-ai",
            Page::Dashboard => "dashboard",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::SimulationBudget => "Simulation Budget",
            Page::InfluencerPerformance => "Influencer Performance",
            Page::OptimizedBudget => "Optimized Budget",
            Page::GenAi => "GEN AI",
            Page::Dashboard => "Dashboard",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Page::ALL.into_iter().find(|page| page.slug() == slug)
    }
}

/// State owned by one browser session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub authenticated: bool,
    pub username: Option<String>,
    pub inputs: BudgetInputs,
    /// Unset until a weights table has been seen
    pub category: Option<String>,
    pub page: Page,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            authenticated: false,
            username: None,
            inputs: BudgetInputs::new(),
            category: None,
            page: Page::default(),
        }
    }
}

impl SessionContext {
    /// Mark authenticated for the rest of the session's lifetime
    pub fn login(&mut self, username: &str) {
        self.authenticated = true;
        self.username = Some(username.to_string());
    }

    /// Selected category, reset to the table's first category when unset or
    /// no longer present in `table`
    pub fn resolve_category(&mut self, table: &WeightsTable) -> Option<String> {
        let valid = self
            .category
            .as_deref()
            .is_some_and(|category| table.has_category(category));
        if !valid {
            self.category = table.default_category().map(str::to_string);
        }
        self.category.clone()
    }
}

/// All live sessions
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionContext>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Known session for `id`, or a fresh candidate id; the flag is true when
    /// the returned id is not stored yet
    pub async fn resolve(&self, id: Option<SessionId>) -> (SessionId, bool) {
        if let Some(id) = id {
            if self.sessions.read().await.contains_key(&id) {
                return (id, false);
            }
        }
        (SessionId::new(), true)
    }

    /// Store (or re-authenticate) the session for `id`
    pub async fn login(&self, id: SessionId, username: &str) {
        let mut sessions = self.sessions.write().await;
        let created = !sessions.contains_key(&id);
        sessions.entry(id).or_default().login(username);
        if created {
            debug!(session = %id, "Session started");
        }
    }

    pub async fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    /// Snapshot of a session
    pub async fn get(&self, id: SessionId) -> Option<SessionContext> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Mutate a session in place
    pub async fn update<F, R>(&self, id: SessionId, f: F) -> Option<R>
    where
        F: FnOnce(&mut SessionContext) -> R,
    {
        self.sessions.write().await.get_mut(&id).map(f)
    }

    pub async fn is_authenticated(&self, id: SessionId) -> bool {
        self.sessions
            .read()
            .await
            .get(&id)
            .is_some_and(|session| session.authenticated)
    }

    /// Tear a session down; true if it existed
    pub async fn end(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session = %id, "Session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Session id from the request's `Cookie` header(s)
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(SessionId)
}

/// `Set-Cookie` value establishing a session
pub fn session_cookie(id: SessionId) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

/// `Set-Cookie` value clearing the session cookie
pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Session middleware
///
/// Exposes the caller's `SessionId` (or an unstored candidate) to handlers
/// as a request extension. A `Set-Cookie` is sent only when the candidate
/// was stored while handling the request.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let requested = session_id_from_headers(request.headers());
    let (id, pending) = state.sessions.resolve(requested).await;
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;

    if pending && state.sessions.contains(id).await {
        match HeaderValue::from_str(&session_cookie(id)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Failed to encode session cookie: {}", e),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use nest_common::{Kpi, Tier, WeightEntry};

    #[test]
    fn test_page_slugs_round_trip() {
        for page in Page::ALL {
            assert_eq!(Page::from_slug(page.slug()), Some(page));
        }
        assert_eq!(Page::from_slug("settings"), None);
        assert_eq!(Page::default(), Page::SimulationBudget);
    }

    #[test]
    fn test_cookie_parsing() {
        let id = SessionId::new();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}; other=1", SESSION_COOKIE, id))
                .unwrap(),
        );
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_cookie_parsing_rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("nest_session=not-a-uuid"),
        );
        assert_eq!(session_id_from_headers(&headers), None);
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_new_context_is_zeroed_and_anonymous() {
        let session = SessionContext::default();
        assert!(!session.authenticated);
        assert_eq!(session.inputs.total(), 0.0);
        assert_eq!(session.category, None);
        assert_eq!(session.page, Page::SimulationBudget);
    }

    #[test]
    fn test_resolve_category_defaults_and_repairs() {
        let table = WeightsTable::from_entries(vec![
            WeightEntry::new("Food", Kpi::View, Tier::Vip, 1.0),
            WeightEntry::new("Beauty", Kpi::View, Tier::Vip, 1.0),
        ]);
        let mut session = SessionContext::default();

        assert_eq!(session.resolve_category(&table).as_deref(), Some("Beauty"));

        session.category = Some("Food".to_string());
        assert_eq!(session.resolve_category(&table).as_deref(), Some("Food"));

        session.category = Some("Gone".to_string());
        assert_eq!(session.resolve_category(&table).as_deref(), Some("Beauty"));
    }

    #[tokio::test]
    async fn test_store_lifecycle() {
        let store = SessionStore::new();
        let (id, pending) = store.resolve(None).await;
        assert!(pending);
        assert!(!store.is_authenticated(id).await);
        assert!(store.is_empty().await);

        store.login(id, "mbcs").await;
        assert!(store.is_authenticated(id).await);
        assert_eq!(
            store.get(id).await.unwrap().username.as_deref(),
            Some("mbcs")
        );

        let (same, pending) = store.resolve(Some(id)).await;
        assert_eq!(same, id);
        assert!(!pending);

        assert!(store.end(id).await);
        assert!(store.get(id).await.is_none());
        assert!(!store.end(id).await);
    }

    #[tokio::test]
    async fn test_resolve_never_stores_anonymous_ids() {
        let store = SessionStore::new();
        let unknown = SessionId::new();

        for _ in 0..100 {
            let (id, pending) = store.resolve(Some(unknown)).await;
            assert!(pending);
            assert_ne!(id, unknown);
            assert!(store.update(id, |s| s.page = Page::Dashboard).await.is_none());
        }
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_repeat_login_keeps_inputs() {
        let store = SessionStore::new();
        let id = SessionId::new();
        store.login(id, "mbcs").await;
        store.update(id, |s| s.inputs.set(Tier::Mid, 5.0)).await;

        store.login(id, "mbcs1").await;
        let session = store.get(id).await.unwrap();
        assert_eq!(session.inputs.get(Tier::Mid), 5.0);
        assert_eq!(session.username.as_deref(), Some("mbcs1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new();
        let a = SessionId::new();
        let b = SessionId::new();
        store.login(a, "mbcs").await;
        store.login(b, "mbcs1").await;

        store
            .update(a, |s| {
                s.inputs.set(Tier::Vip, 100.0);
            })
            .await;

        assert_eq!(store.get(a).await.unwrap().inputs.get(Tier::Vip), 100.0);
        assert_eq!(store.get(b).await.unwrap().inputs.get(Tier::Vip), 0.0);
    }
}
