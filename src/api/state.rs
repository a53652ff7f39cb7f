use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::core::AppConfig;

/// How long a login redirect may take before its `state` is forgotten
pub const LOGIN_STATE_TTL_MINUTES: i64 = 10;

/// Sessions unused for this long are dropped
pub const SESSION_IDLE_TTL_HOURS: i64 = 24;

/// Tokens obtained for one browser session
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used: DateTime<Utc>,
}

impl Session {
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
            last_used: Utc::now(),
        }
    }

    /// Expired, or about to expire within a minute
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => Utc::now() >= exp - Duration::seconds(60),
            None => false,
        }
    }

    pub fn is_idle(&self, now: DateTime<Utc>) -> bool {
        now - self.last_used > Duration::hours(SESSION_IDLE_TTL_HOURS)
    }
}

pub struct AppState {
    pub config: AppConfig,
    // Session id (cookie value) to tokens
    pub sessions: HashMap<String, Session>,
    // `state` values handed out by the login redirect, with issue time
    pub pending_logins: HashMap<String, DateTime<Utc>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            pending_logins: HashMap::new(),
        }
    }

    /// Remember a login `state`, forgetting the ones that went stale
    pub fn insert_pending_login(&mut self, login_state: String, now: DateTime<Utc>) {
        let ttl = Duration::minutes(LOGIN_STATE_TTL_MINUTES);
        self.pending_logins.retain(|_, issued| now - *issued <= ttl);
        self.pending_logins.insert(login_state, now);
    }

    /// Consume a login `state`. Unknown and stale states are rejected.
    pub fn take_pending_login(&mut self, login_state: &str, now: DateTime<Utc>) -> bool {
        match self.pending_logins.remove(login_state) {
            Some(issued) => now - issued <= Duration::minutes(LOGIN_STATE_TTL_MINUTES),
            None => false,
        }
    }

    /// Store a session under `id`, dropping idle sessions first
    pub fn insert_session(&mut self, id: String, session: Session) {
        let now = Utc::now();
        self.sessions.retain(|_, s| !s.is_idle(now));
        self.sessions.insert(id, session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            google_client_id: "id".to_string(),
            google_client_secret: "secret".to_string(),
            google_redirect_uri: "http://localhost/cb".to_string(),
            google_auth_url: "http://localhost/auth".to_string(),
            google_token_url: "http://localhost/token".to_string(),
            google_scopes: "openid".to_string(),
            gmail_api_base_url: "http://localhost".to_string(),
            sender_address: "me".to_string(),
            inbox_limit: 10,
            static_dir: "./static".to_string(),
        }
    }

    #[test]
    fn test_session_expiry() {
        let session = |expires_at| Session::new("t".to_string(), None, expires_at);
        assert!(!session(None).is_expired());
        assert!(!session(Some(Utc::now() + Duration::hours(1))).is_expired());
        assert!(session(Some(Utc::now() + Duration::seconds(30))).is_expired());
        assert!(session(Some(Utc::now() - Duration::hours(1))).is_expired());
    }

    #[test]
    fn test_stale_login_states_are_pruned() {
        let mut state = AppState::new(config());
        let start = Utc::now();
        for i in 0..1000 {
            state.insert_pending_login(format!("abandoned-{}", i), start);
        }
        assert_eq!(state.pending_logins.len(), 1000);

        let later = start + Duration::minutes(LOGIN_STATE_TTL_MINUTES + 1);
        state.insert_pending_login("fresh".to_string(), later);
        assert_eq!(state.pending_logins.len(), 1);
        assert!(state.pending_logins.contains_key("fresh"));
    }

    #[test]
    fn test_take_pending_login() {
        let mut state = AppState::new(config());
        let now = Utc::now();
        state.insert_pending_login("ok".to_string(), now);
        assert!(state.take_pending_login("ok", now));
        // Only once
        assert!(!state.take_pending_login("ok", now));
        assert!(!state.take_pending_login("unknown", now));

        state.insert_pending_login("old".to_string(), now);
        let later = now + Duration::minutes(LOGIN_STATE_TTL_MINUTES + 1);
        assert!(!state.take_pending_login("old", later));
        assert!(state.pending_logins.is_empty());
    }

    #[test]
    fn test_idle_sessions_are_pruned() {
        let mut state = AppState::new(config());
        let mut idle = Session::new("old".to_string(), Some("1//refresh".to_string()), None);
        idle.last_used = Utc::now() - Duration::hours(SESSION_IDLE_TTL_HOURS + 1);
        state.sessions.insert("idle".to_string(), idle);
        state.sessions.insert(
            "active".to_string(),
            Session::new("new".to_string(), None, None),
        );

        state.insert_session("fresh".to_string(), Session::new("t".to_string(), None, None));

        assert!(!state.sessions.contains_key("idle"));
        assert!(state.sessions.contains_key("active"));
        assert!(state.sessions.contains_key("fresh"));
    }
}
