use async_trait::async_trait;
use pmaas_core::AppResult;
use pmaas_domain::{EmailAddress, User, UserId};

/// Paging parameters for user listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserListQuery {
    /// Maximum rows returned.
    pub limit: u32,
    /// Rows skipped.
    pub offset: u32,
}

impl Default for UserListQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

/// Repository port for user persistence.
///
/// Users are returned without roles; role loading goes through
/// `RoleRepository::list_user_roles`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new user. Returns `AppError::Conflict` on a duplicate
    /// external id, username or email.
    async fn create(&self, user: &User) -> AppResult<()>;

    /// Finds a user by identifier.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>>;

    /// Finds a user by external identity subject.
    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<User>>;

    /// Finds a user by its stored email address.
    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<User>>;

    /// Persists identity, profile, status, login and account security fields.
    /// Returns `AppError::Conflict` when the username or email is taken by
    /// another user and `AppError::NotFound` when the user does not exist.
    async fn update(&self, user: &User) -> AppResult<()>;

    /// Deletes a user together with its assignments and sessions.
    async fn delete(&self, user_id: UserId) -> AppResult<()>;

    /// Lists users, newest first.
    async fn list(&self, query: UserListQuery) -> AppResult<Vec<User>>;
}
