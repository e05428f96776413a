//! In-memory login sessions keyed by a random cookie value.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::errors::{DataTuneError, Result};

pub const SESSION_COOKIE: &str = "datatune_session";

const SESSION_ID_BYTES: usize = 32;

/// What the login page posts to `/auth/callback` after sign-in.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub session_token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub email: Option<String>,
    pub name: String,
    pub session_token: Option<String>,
    /// Broker refresh token, needed to start provider connections.
    pub refresh_token: Option<String>,
    created: Instant,
}

pub struct SessionStore {
    rng: SystemRandom,
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            rng: SystemRandom::new(),
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Start a session for a signed-in user. Expired sessions are swept.
    pub async fn create(&self, login: LoginPayload) -> Result<Session> {
        let user_id = login
            .user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| DataTuneError::Auth("userId is required".into()))?;

        let name = login
            .name
            .clone()
            .or_else(|| login.email.clone())
            .unwrap_or_else(|| "User".to_string());

        let session = Session {
            id: self.new_session_id()?,
            user_id,
            email: login.email,
            name,
            session_token: login.session_token,
            refresh_token: login.refresh_token,
            created: Instant::now(),
        };

        let mut sessions = self.sessions.write().await;
        let ttl = self.ttl;
        sessions.retain(|_, s| s.created.elapsed() < ttl);
        sessions.insert(session.id.clone(), session.clone());
        tracing::info!(user_id = %session.user_id, "user authenticated");
        Ok(session)
    }

    /// Look up a live session.
    pub async fn get(&self, id: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .filter(|s| s.created.elapsed() < self.ttl)
            .cloned()
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn new_session_id(&self) -> Result<String> {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| DataTuneError::Application("system RNG failure".into()))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

/// Session cookie for a new login. It carries no `Max-Age`; the store's
/// TTL decides when the session ends.
pub fn session_cookie(id: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Template matching the session cookie's path, for removal from a jar.
pub fn session_cookie_removal() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Session id carried by the request's cookies, if any.
pub fn session_id(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    fn login(user: Option<&str>) -> LoginPayload {
        LoginPayload {
            user_id: user.map(str::to_string),
            email: Some("ada@example.com".into()),
            name: None,
            session_token: None,
            refresh_token: Some("r".into()),
        }
    }

    #[tokio::test]
    async fn create_and_get() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create(login(Some("u1"))).await.unwrap();

        assert_eq!(session.name, "ada@example.com");
        let found = store.get(&session.id).await.unwrap();
        assert_eq!(found.user_id, "u1");
        assert_eq!(found.refresh_token.as_deref(), Some("r"));
    }

    #[tokio::test]
    async fn session_ids_are_random_and_url_safe() {
        let store = SessionStore::new(Duration::from_secs(60));
        let a = store.create(login(Some("u1"))).await.unwrap();
        let b = store.create(login(Some("u1"))).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 43);
        assert!(a.id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn missing_user_id_is_rejected() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert!(matches!(store.create(login(None)).await, Err(DataTuneError::Auth(_))));
        assert!(store.create(login(Some("  "))).await.is_err());
    }

    #[tokio::test]
    async fn expired_sessions_are_not_returned() {
        let store = SessionStore::new(Duration::from_millis(10));
        let session = store.create(login(Some("u1"))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.get(&session.id).await.is_none());
    }

    #[tokio::test]
    async fn remove_drops_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create(login(Some("u1"))).await.unwrap();
        assert!(store.remove(&session.id).await);
        assert!(!store.remove(&session.id).await);
        assert_eq!(store.len().await, 0);
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc");
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn session_id_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; datatune_session=abc"),
        );
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(session_id(&jar), Some("abc"));
    }

    #[test]
    fn empty_or_absent_cookie_is_none() {
        let mut headers = HeaderMap::new();
        assert!(session_id(&CookieJar::from_headers(&headers)).is_none());

        headers.insert(header::COOKIE, HeaderValue::from_static("datatune_session="));
        assert!(session_id(&CookieJar::from_headers(&headers)).is_none());
    }

    #[test]
    fn removal_clears_the_cookie() {
        let jar = CookieJar::new().add(session_cookie("abc"));
        let jar = jar.remove(session_cookie_removal());
        assert!(session_id(&jar).is_none());
    }
}
