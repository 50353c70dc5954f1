//! PostgreSQL-backed user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pmaas_application::{UserListQuery, UserRepository};
use pmaas_core::{AppError, AppResult};
use pmaas_domain::{
    EmailAddress, PasswordResetTicket, User, UserId, UserProfile, UserStatus,
};

/// PostgreSQL implementation of the user repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: uuid::Uuid,
    external_id: Option<String>,
    username: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone_number: Option<String>,
    profile_picture_url: Option<String>,
    status: String,
    email_verified: bool,
    mfa_enabled: bool,
    mfa_secret: Option<String>,
    password_reset_token_hash: Option<String>,
    password_reset_expires_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = row.email.map(EmailAddress::new).transpose()?;
        let profile = UserProfile::new(row.username)?
            .with_email(email, row.email_verified)
            .with_names(row.first_name, row.last_name)
            .with_contact(row.phone_number, row.profile_picture_url);
        let password_reset = row
            .password_reset_token_hash
            .zip(row.password_reset_expires_at)
            .map(|(token_hash, expires_at)| PasswordResetTicket::new(token_hash, expires_at));

        Ok(
            User::new(UserId::from_uuid(row.id), profile, row.created_at)
                .with_external_id(row.external_id)
                .with_status(row.status.parse::<UserStatus>()?)
                .with_last_login_at(row.last_login_at)
                .with_mfa(row.mfa_enabled, row.mfa_secret)
                .with_password_reset(password_reset)
                .with_timestamps(row.created_at, row.updated_at),
        )
    }
}

const USER_COLUMNS: &str = "id, external_id, username, email, first_name, last_name, \
     phone_number, profile_picture_url, status, email_verified, mfa_enabled, mfa_secret, \
     password_reset_token_hash, password_reset_expires_at, last_login_at, created_at, updated_at";

mod account;
mod lookup;


#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> AppResult<()> {
        self.create_impl(user).await
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        self.find_by_id_impl(user_id).await
    }

    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<User>> {
        self.find_by_external_id_impl(external_id).await
    }

    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<User>> {
        self.find_by_email_impl(email).await
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        self.update_impl(user).await
    }

    async fn delete(&self, user_id: UserId) -> AppResult<()> {
        self.delete_impl(user_id).await
    }

    async fn list(&self, query: UserListQuery) -> AppResult<Vec<User>> {
        self.list_impl(query).await
    }
}

fn user_conflict_or_internal(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(
            "a user with this identity, username or email already exists".to_owned(),
        );
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}
