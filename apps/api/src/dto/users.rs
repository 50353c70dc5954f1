use chrono::{DateTime, Utc};
use pmaas_domain::User;
use serde::{Deserialize, Serialize};

use super::RoleResponse;

/// Incoming payload for direct registration.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Incoming payload for self-service profile updates.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

/// Incoming payload for administrative user updates.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Paging parameters for the user listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// API representation of a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub external_id: Option<String>,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture_url: Option<String>,
    pub status: String,
    pub email_verified: bool,
    pub mfa_enabled: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub roles: Vec<RoleResponse>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        let profile = user.profile();
        Self {
            id: user.id().to_string(),
            external_id: user.external_id().map(str::to_owned),
            username: user.username().to_owned(),
            email: profile.email().map(|email| email.as_str().to_owned()),
            first_name: profile.first_name().map(str::to_owned),
            last_name: profile.last_name().map(str::to_owned),
            phone_number: profile.phone_number().map(str::to_owned),
            profile_picture_url: profile.profile_picture_url().map(str::to_owned),
            status: user.status().as_str().to_owned(),
            email_verified: profile.email_verified(),
            mfa_enabled: user.mfa_enabled(),
            last_login_at: user.last_login_at(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
            roles: user.roles().iter().map(RoleResponse::from).collect(),
        }
    }
}

/// The current principal together with its effective permissions.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub permissions: Vec<String>,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            user: UserResponse::from(user),
            permissions: user
                .permissions()
                .as_slice()
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

/// Confirmation of a minted server session.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub expires_at: DateTime<Utc>,
}

/// Incoming payload for a password reset request.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}
