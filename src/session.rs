use std::{collections::HashMap, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "bria_session";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub api_key: Option<String>,
    pub current_image_url: Option<String>,
    pub generated_images: Vec<String>,
    pub original_prompt: String,
    pub enhanced_prompt: Option<String>,
}

impl SessionState {
    pub fn fresh(default_api_key: Option<String>) -> Self {
        Self { api_key: default_api_key, ..Default::default() }
    }

    pub fn api_key(&self) -> Result<String, AppError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or(AppError::MissingApiKey)
    }

    pub fn effective_prompt(&self, submitted: Option<&str>) -> Option<String> {
        self.enhanced_prompt
            .as_deref()
            .into_iter()
            .chain(submitted)
            .map(str::trim)
            .find(|prompt| !prompt.is_empty())
            .map(str::to_string)
    }

    pub fn record_results(&mut self, urls: &[String]) {
        self.current_image_url = urls.first().cloned();
        self.generated_images = urls.to_vec();
    }

    pub fn set_current_image(&mut self, url: &str) {
        self.current_image_url = Some(url.to_string());
    }
}

struct SessionEntry {
    state: SessionState,
    last_seen: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    default_api_key: Option<String>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(default_api_key: Option<String>, ttl_secs: i64) -> Self {
        Self {
            sessions: RwLock::default(),
            default_api_key,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn fresh_state(&self) -> SessionState {
        SessionState::fresh(self.default_api_key.clone())
    }

    pub fn create(&self) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        if sessions.len() < before {
            debug!("Pruned {} idle session(s)", before - sessions.len());
        }
        sessions.insert(id, SessionEntry { state: self.fresh_state(), last_seen: now });
        id
    }

    pub fn load(&self, id: Uuid) -> Option<SessionState> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let entry = sessions.get_mut(&id)?;
        if self.is_expired(entry, now) {
            sessions.remove(&id);
            return None;
        }
        entry.last_seen = now;
        Some(entry.state.clone())
    }

    pub fn save(&self, id: Uuid, state: SessionState) {
        self.sessions
            .write()
            .insert(id, SessionEntry { state, last_seen: Utc::now() });
    }

    pub fn reset(&self, id: Uuid) -> SessionState {
        let state = self.fresh_state();
        self.save(id, state.clone());
        state
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.last_seen > self.ttl
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);

fn cookie_session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

// Resolves the session cookie, starting a new session when it is missing
// or stale, and sets the cookie on the way out for new sessions.
pub async fn session_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let existing = cookie_session_id(req.headers()).filter(|id| state.sessions.load(*id).is_some());
    let (id, is_new) = match existing {
        Some(id) => (id, false),
        None => (state.sessions.create(), true),
    };
    req.extensions_mut().insert(SessionId(id));

    let mut response = next.run(req).await;
    if is_new {
        let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

pub struct Session {
    id: Uuid,
    pub state: SessionState,
    store: Arc<SessionStore>,
}

impl Session {
    pub fn commit(self) {
        self.store.save(self.id, self.state);
    }

    pub fn reset(&mut self) {
        self.state = self.store.reset(self.id);
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let SessionId(id) = parts
            .extensions
            .get::<SessionId>()
            .copied()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "session layer not installed"))?;
        let store = state.sessions.clone();
        let session_state = store.load(id).unwrap_or_else(|| store.fresh_state());
        Ok(Session { id, state: session_state, store })
    }
}
