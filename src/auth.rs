use axum::http::{header::COOKIE, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "dashboard_session";

const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    #[default]
    Unset,
    Rejected,
    Accepted,
}

pub fn check_credentials(username: &str, password: &str) -> bool {
    username == ADMIN_USERNAME && password == ADMIN_PASSWORD
}

pub fn authenticate(username: &str, password: &str) -> AuthStatus {
    if check_credentials(username, password) {
        AuthStatus::Accepted
    } else {
        AuthStatus::Rejected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionContext {
    pub status: AuthStatus,
}

impl SessionContext {
    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Accepted
    }
}

const MAX_SESSIONS: usize = 1024;
const SESSION_TTL_HOURS: i64 = 12;

#[derive(Debug, Clone, Copy)]
struct Entry {
    context: SessionContext,
    last_seen: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Entry>>>,
    capacity: usize,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(MAX_SESSIONS, Duration::hours(SESSION_TTL_HOURS))
    }
}

impl SessionStore {
    pub fn with_limits(capacity: usize, ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Unknown, missing or idle ids resolve to a fresh, unset context.
    pub async fn context(&self, id: Option<&str>) -> SessionContext {
        let Some(id) = id else {
            return SessionContext::default();
        };
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(id) {
            Some(entry) if now - entry.last_seen < self.ttl => {
                entry.last_seen = now;
                entry.context
            }
            Some(_) => {
                sessions.remove(id);
                SessionContext::default()
            }
            None => SessionContext::default(),
        }
    }

    /// Records a login attempt and returns the session id to hand back to the browser.
    /// Only ids this store issued are reused; anything else gets a new id.
    pub async fn login(&self, id: Option<&str>, username: &str, password: &str) -> (String, AuthStatus) {
        let status = authenticate(username, password);
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, entry| now - entry.last_seen < self.ttl);

        let id = match id {
            Some(id) if sessions.contains_key(id) => id.to_string(),
            _ => {
                if sessions.len() >= self.capacity {
                    evict_oldest(&mut sessions);
                }
                Uuid::new_v4().simple().to_string()
            }
        };
        sessions.insert(
            id.clone(),
            Entry {
                context: SessionContext { status },
                last_seen: now,
            },
        );
        info!(?status, sessions = sessions.len(), "login attempt");
        (id, status)
    }

    pub async fn logout(&self, id: Option<&str>) {
        if let Some(id) = id {
            if self.sessions.lock().await.remove(id).is_some() {
                info!("session closed");
            }
        }
    }
}

fn evict_oldest(sessions: &mut HashMap<String, Entry>) {
    let oldest = sessions
        .iter()
        .min_by_key(|(_, entry)| entry.last_seen)
        .map(|(id, _)| id.clone());
    if let Some(id) = oldest {
        sessions.remove(&id);
        warn!("session store full, dropped least recently used session");
    }
}

pub fn session_id(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key.trim() == SESSION_COOKIE && !value.trim().is_empty() {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

pub fn session_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Strict")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}
