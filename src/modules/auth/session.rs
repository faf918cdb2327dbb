use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::modules::auth::service::connector::Provider;
use crate::modules::category::repository::CategoryView;
use crate::types::{AppContext, AppEnvironment};

pub const SESSION_COOKIE: &str = "catalogue_session";

const STATE_TOKEN_LENGTH: usize = 32;
const STATE_TOKEN_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Per-browser state. Every key is an `Option` so that "never set" stays
/// distinguishable from "set to something empty".
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub state: Option<String>,
    pub user_id: Option<i32>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
    pub provider: Option<Provider>,
    pub access_token: Option<String>,
    pub gplus_id: Option<String>,
    pub facebook_id: Option<String>,
    pub categories: Option<Vec<CategoryView>>,
    pub flash: Vec<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    pub fn push_flash(&mut self, message: String) {
        self.flash.push(message);
    }

    pub fn take_flash(&mut self) -> Vec<String> {
        std::mem::take(&mut self.flash)
    }

    pub fn clear_google(&mut self) {
        self.access_token = None;
        self.gplus_id = None;
        self.username = None;
        self.email = None;
        self.picture = None;
    }

    pub fn clear_facebook(&mut self) {
        self.access_token = None;
        self.facebook_id = None;
    }

    pub fn clear_identity(&mut self) {
        self.user_id = None;
        self.username = None;
        self.email = None;
        self.picture = None;
        self.provider = None;
        self.access_token = None;
        self.gplus_id = None;
        self.facebook_id = None;
    }
}

struct Entry {
    session: Session,
    expires_at: DateTime<Utc>,
}

/// In-process store mapping opaque cookie tokens to sessions. Entries expire
/// a fixed interval after their last write and are swept on access.
#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn issue_token() -> String {
        Ulid::new().to_string()
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        let mut entries = self.entries.lock().await;
        let now = Utc::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.get(token).map(|entry| entry.session.clone())
    }

    pub async fn put(&self, token: &str, session: Session) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            token.to_string(),
            Entry {
                session,
                expires_at: Utc::now() + self.ttl,
            },
        );
    }

    pub async fn remove(&self, token: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(token);
    }
}

/// Anti-forgery token embedded in the login page and echoed back by the
/// OAuth callbacks. Regenerated on every visit to the login view.
pub fn generate_state_token() -> String {
    let mut rng = rand::thread_rng();
    (0..STATE_TOKEN_LENGTH)
        .map(|_| STATE_TOKEN_CHARS[rng.gen_range(0..STATE_TOKEN_CHARS.len())] as char)
        .collect()
}

pub fn session_cookie(app: &AppContext, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(matches!(app.environment, AppEnvironment::Production))
        .build()
}

pub async fn load(store: &SessionStore, jar: &CookieJar) -> Option<(String, Session)> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    let session = store.get(&token).await?;
    Some((token, session))
}

pub async fn load_or_create(store: &SessionStore, jar: &CookieJar) -> (String, Session) {
    match load(store, jar).await {
        Some(found) => found,
        None => (SessionStore::issue_token(), Session::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_token_is_distinct_from_stored_empty_session() {
        let store = SessionStore::new(Duration::hours(1));
        assert!(store.get("missing").await.is_none());

        store.put("token", Session::default()).await;
        let session = store.get("token").await.unwrap();
        assert!(session.state.is_none());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn entries_expire_after_the_ttl() {
        let store = SessionStore::new(Duration::milliseconds(-1));
        store.put("token", Session::default()).await;
        assert!(store.get("token").await.is_none());
    }

    #[tokio::test]
    async fn remove_drops_the_entry() {
        let store = SessionStore::new(Duration::hours(1));
        store.put("token", Session::default()).await;
        store.remove("token").await;
        assert!(store.get("token").await.is_none());
    }

    #[test]
    fn state_tokens_are_32_uppercase_alphanumerics() {
        let token = generate_state_token();
        assert_eq!(token.len(), 32);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn state_tokens_are_not_repeated() {
        assert_ne!(generate_state_token(), generate_state_token());
    }

    #[test]
    fn flash_messages_drain_on_take() {
        let mut session = Session::default();
        session.push_flash(String::from("Menu Item: Cleats was added"));
        assert_eq!(session.take_flash().len(), 1);
        assert!(session.take_flash().is_empty());
    }

    #[test]
    fn clearing_identity_keeps_the_category_cache() {
        let mut session = Session {
            user_id: Some(1),
            username: Some(String::from("Ada")),
            categories: Some(vec![]),
            ..Session::default()
        };
        session.clear_identity();
        assert!(!session.is_authenticated());
        assert!(session.user_id.is_none());
        assert!(session.categories.is_some());
    }
}
