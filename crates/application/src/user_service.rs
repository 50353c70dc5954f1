//! User lifecycle outside of federated login: direct registration,
//! retrieval, profile edits and administration.

use std::sync::Arc;

use pmaas_core::AppResult;
use pmaas_domain::{User, UserStatus};

use crate::{RoleService, UserRepository};

pub use password_reset::{IssuedPasswordReset, PASSWORD_RESET_TTL_HOURS};

mod admin;
mod password_reset;
mod registration;
mod retrieval;


/// Input for direct registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserInput {
    /// Unique username.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Optional given name.
    pub first_name: Option<String>,
    /// Optional family name.
    pub last_name: Option<String>,
}

/// Self-service profile changes. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateProfileInput {
    /// New email address.
    pub email: Option<String>,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New phone number; blank clears it.
    pub phone_number: Option<String>,
    /// New profile picture URL; blank clears it.
    pub profile_picture_url: Option<String>,
}

/// Administrative user changes. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateUserInput {
    /// New username.
    pub username: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New email verification flag.
    pub email_verified: Option<bool>,
    /// New account status.
    pub status: Option<UserStatus>,
}

/// Application service for user records.
#[derive(Clone)]
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    role_service: RoleService,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(user_repository: Arc<dyn UserRepository>, role_service: RoleService) -> Self {
        Self {
            user_repository,
            role_service,
        }
    }

    async fn with_roles(&self, user: User) -> AppResult<User> {
        let roles = self.role_service.list_user_roles(user.id()).await?;
        Ok(user.with_roles(roles))
    }
}
