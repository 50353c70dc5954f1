use std::sync::Arc;

use chrono::{Duration, Utc};
use pmaas_core::AppResult;
use pmaas_domain::{UserId, UserSession};
use uuid::Uuid;

use crate::SessionRepository;
use crate::token_crypto::{generate_token, hash_token};

/// Default lifetime of a server-side session.
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;

/// A freshly created session together with the raw token for the cookie.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Raw token; only ever handed to the client.
    pub token: String,
    /// Stored session record.
    pub session: UserSession,
}

/// Application service for opaque session tokens.
#[derive(Clone)]
pub struct SessionService {
    repository: Arc<dyn SessionRepository>,
    ttl: Duration,
}

impl SessionService {
    /// Creates a session service with the default 24 hour lifetime.
    #[must_use]
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self {
            repository,
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECONDS),
        }
    }

    /// Overrides the session lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the session lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates and stores a session for `user_id`.
    pub async fn create_session(
        &self,
        user_id: UserId,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> AppResult<IssuedSession> {
        let (token, token_hash) = generate_token()?;
        let now = Utc::now();
        let session = UserSession::new(Uuid::new_v4(), user_id, token_hash, now + self.ttl, now)
            .with_client(ip_address, user_agent);

        self.repository.create_session(&session).await?;
        Ok(IssuedSession { token, session })
    }

    /// Returns the unexpired session for a raw token.
    pub async fn find_active_session(&self, token: &str) -> AppResult<Option<UserSession>> {
        if token.is_empty() {
            return Ok(None);
        }

        self.repository
            .find_active_session(&hash_token(token), Utc::now())
            .await
    }

    /// Deletes the session for a raw token, if any.
    pub async fn revoke_session(&self, token: &str) -> AppResult<()> {
        if token.is_empty() {
            return Ok(());
        }

        self.repository.delete_session(&hash_token(token)).await
    }

    /// Deletes all expired sessions and returns how many were removed.
    pub async fn cleanup_expired_sessions(&self) -> AppResult<u64> {
        self.repository.delete_expired_sessions(Utc::now()).await
    }
}
