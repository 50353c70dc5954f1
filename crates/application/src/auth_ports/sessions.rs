use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pmaas_core::AppResult;
use pmaas_domain::UserSession;

/// Repository port for server-side sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Stores a new session.
    async fn create_session(&self, session: &UserSession) -> AppResult<()>;

    /// Finds a session by token hash that is still valid at `now`.
    async fn find_active_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<UserSession>>;

    /// Deletes a session by token hash. Deleting a missing session succeeds.
    async fn delete_session(&self, token_hash: &str) -> AppResult<()>;

    /// Deletes every session that expired at or before `now`.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
