use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use log::{debug, info, warn};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const COOKIE_NAME: &str = "goodmorning.sid";

/// Longest lifetime a session may be given.
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Identity of the calling client, inserted into saved-number requests by
/// [`session_middleware`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Issues session ids and remembers when each one expires.
pub struct SessionManager {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Instant>>,
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: ttl.min(MAX_SESSION_TTL),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the live session named by `presented`, or a fresh one.
    /// The flag is true when a new session was issued.
    pub async fn resolve(&self, presented: Option<&str>) -> (SessionId, bool) {
        let now = Instant::now();
        if let Some(id) = presented {
            if let Some(expires_at) = self.sessions.read().await.get(id) {
                if *expires_at > now {
                    return (SessionId(id.to_string()), false);
                }
            }
        }

        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        if let Some(stale) = presented {
            sessions.remove(stale);
        }
        let expires_at = now
            .checked_add(self.ttl)
            .or_else(|| now.checked_add(MAX_SESSION_TTL))
            .unwrap_or(now);
        sessions.insert(id.clone(), expires_at);
        debug!("Issued session {}", id);
        (SessionId(id), true)
    }

    pub async fn prune(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, expires_at| *expires_at > now);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn set_cookie(&self, id: &SessionId) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            COOKIE_NAME,
            id.as_str(),
            self.ttl.as_secs()
        ))
        .ok()
    }
}

/// Periodically drops expired sessions. Stops once the manager is gone.
pub fn spawn_pruner(sessions: &Arc<SessionManager>, every: Duration) -> JoinHandle<()> {
    let sessions: Weak<SessionManager> = Arc::downgrade(sessions);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // the first tick fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(sessions) = sessions.upgrade() else {
                break;
            };
            let pruned = sessions.prune().await;
            if pruned > 0 {
                info!("Pruned {} expired sessions", pruned);
            }
        }
    })
}

fn cookie_value<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub async fn session_middleware(
    State(sessions): State<Arc<SessionManager>>,
    mut req: Request,
    next: Next,
) -> Response {
    let presented = cookie_value(&req, COOKIE_NAME).map(str::to_string);
    let (session, issued) = sessions.resolve(presented.as_deref()).await;

    req.extensions_mut().insert(session.clone());
    let mut response = next.run(req).await;

    if issued {
        match sessions.set_cookie(&session) {
            Some(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            None => warn!("Could not encode session cookie for {}", session.as_str()),
        }
    }
    response
}
