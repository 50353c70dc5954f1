//! User domain types.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use pmaas_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;
use crate::security::PermissionSet;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated, lowercased email address.
    ///
    /// Checks structure only: one `@`, non-empty local part, a dotted domain.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the part before the `@`.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or(self.0.as_str(), |(local, _)| local)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// May authenticate.
    Active,
    /// Temporarily blocked by an administrator.
    Suspended,
    /// Soft-deleted.
    Inactive,
}

impl UserStatus {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Inactive => "inactive",
        }
    }

    /// Returns true when the account may be attached to requests.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl FromStr for UserStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "inactive" => Ok(Self::Inactive),
            _ => Err(AppError::Validation(format!(
                "unknown user status '{value}'"
            ))),
        }
    }
}

/// Editable profile attributes of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    username: NonEmptyString,
    email: Option<EmailAddress>,
    first_name: Option<String>,
    last_name: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    profile_picture_url: Option<String>,
    email_verified: bool,
}

impl UserProfile {
    /// Creates a profile with a validated username.
    pub fn new(username: impl Into<String>) -> AppResult<Self> {
        let username = username.into().trim().to_owned();
        Ok(Self {
            username: NonEmptyString::new(username)?,
            email: None,
            first_name: None,
            last_name: None,
            phone_number: None,
            profile_picture_url: None,
            email_verified: false,
        })
    }

    /// Sets the email address and its verification flag.
    #[must_use]
    pub fn with_email(mut self, email: Option<EmailAddress>, verified: bool) -> Self {
        self.email = email;
        self.email_verified = verified;
        self
    }

    /// Sets the given and family names, dropping blank values.
    #[must_use]
    pub fn with_names(mut self, first_name: Option<String>, last_name: Option<String>) -> Self {
        self.first_name = normalize_name(first_name);
        self.last_name = normalize_name(last_name);
        self
    }

    /// Sets the contact phone number and avatar URL, dropping blank values.
    #[must_use]
    pub fn with_contact(
        mut self,
        phone_number: Option<String>,
        profile_picture_url: Option<String>,
    ) -> Self {
        self.phone_number = normalize_name(phone_number);
        self.profile_picture_url = normalize_name(profile_picture_url);
        self
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the email address, if known.
    #[must_use]
    pub fn email(&self) -> Option<&EmailAddress> {
        self.email.as_ref()
    }

    /// Returns the first name.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    /// Returns the last name.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Returns the contact phone number.
    #[must_use]
    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    /// Returns the profile picture URL.
    #[must_use]
    pub fn profile_picture_url(&self) -> Option<&str> {
        self.profile_picture_url.as_deref()
    }

    /// Returns whether the email address has been verified.
    #[must_use]
    pub fn email_verified(&self) -> bool {
        self.email_verified
    }
}

/// A pending password reset: the hash of the mailed token and its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetTicket {
    token_hash: String,
    expires_at: DateTime<Utc>,
}

impl PasswordResetTicket {
    /// Creates a ticket for an already hashed token.
    #[must_use]
    pub fn new(token_hash: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token_hash: token_hash.into(),
            expires_at,
        }
    }

    /// Returns the SHA-256 hex digest of the raw token.
    #[must_use]
    pub fn token_hash(&self) -> &str {
        self.token_hash.as_str()
    }

    /// Returns the expiry timestamp.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

fn normalize_name(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim().to_owned();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

/// A principal known to the application, with its loaded roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    external_id: Option<String>,
    profile: UserProfile,
    status: UserStatus,
    last_login_at: Option<DateTime<Utc>>,
    mfa_enabled: bool,
    #[serde(skip)]
    mfa_secret: Option<String>,
    #[serde(skip)]
    password_reset: Option<PasswordResetTicket>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    roles: Vec<Role>,
}

impl User {
    /// Creates an active user with no roles, stamped at `now`.
    #[must_use]
    pub fn new(id: UserId, profile: UserProfile, now: DateTime<Utc>) -> Self {
        Self {
            id,
            external_id: None,
            profile,
            status: UserStatus::Active,
            last_login_at: None,
            mfa_enabled: false,
            mfa_secret: None,
            password_reset: None,
            created_at: now,
            updated_at: now,
            roles: Vec::new(),
        }
    }

    /// Sets the external identity subject.
    #[must_use]
    pub fn with_external_id(mut self, external_id: Option<String>) -> Self {
        self.external_id = external_id;
        self
    }

    /// Sets the account status.
    #[must_use]
    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the last login timestamp.
    #[must_use]
    pub fn with_last_login_at(mut self, last_login_at: Option<DateTime<Utc>>) -> Self {
        self.last_login_at = last_login_at;
        self
    }

    /// Sets the stored TOTP state.
    #[must_use]
    pub fn with_mfa(mut self, enabled: bool, secret: Option<String>) -> Self {
        self.mfa_enabled = enabled && secret.is_some();
        self.mfa_secret = secret;
        self
    }

    /// Sets the stored password reset ticket.
    #[must_use]
    pub fn with_password_reset(mut self, ticket: Option<PasswordResetTicket>) -> Self {
        self.password_reset = ticket;
        self
    }

    /// Sets the stored creation and update timestamps.
    #[must_use]
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    /// Replaces the loaded roles, keeping them ordered by name.
    #[must_use]
    pub fn with_roles(mut self, mut roles: Vec<Role>) -> Self {
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        self.roles = roles;
        self
    }

    /// Returns the user identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the external identity subject, if the user logged in through the provider.
    #[must_use]
    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    /// Returns the profile attributes.
    #[must_use]
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.profile.username()
    }

    /// Returns the account status.
    #[must_use]
    pub fn status(&self) -> UserStatus {
        self.status
    }

    /// Returns the last login timestamp.
    #[must_use]
    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    /// Returns whether TOTP is required for this account.
    #[must_use]
    pub fn mfa_enabled(&self) -> bool {
        self.mfa_enabled
    }

    /// Returns the base32 TOTP secret.
    #[must_use]
    pub fn mfa_secret(&self) -> Option<&str> {
        self.mfa_secret.as_deref()
    }

    /// Returns the pending password reset, if one was requested.
    #[must_use]
    pub fn password_reset(&self) -> Option<&PasswordResetTicket> {
        self.password_reset.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the loaded roles ordered by name.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        self.roles.as_slice()
    }

    /// Replaces the profile and bumps the update timestamp.
    pub fn update_profile(&mut self, profile: UserProfile, now: DateTime<Utc>) {
        self.profile = profile;
        self.updated_at = now;
    }

    /// Changes the account status and bumps the update timestamp.
    pub fn change_status(&mut self, status: UserStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    /// Binds an account created outside the provider to its provider subject.
    pub fn link_external_id(&mut self, external_id: impl Into<String>, now: DateTime<Utc>) {
        self.external_id = Some(external_id.into());
        self.updated_at = now;
    }

    /// Stores a TOTP secret and turns the second factor on.
    pub fn enable_mfa(&mut self, secret: impl Into<String>, now: DateTime<Utc>) {
        self.mfa_secret = Some(secret.into());
        self.mfa_enabled = true;
        self.updated_at = now;
    }

    /// Turns the second factor off and forgets the secret.
    pub fn disable_mfa(&mut self, now: DateTime<Utc>) {
        self.mfa_secret = None;
        self.mfa_enabled = false;
        self.updated_at = now;
    }

    /// Replaces any pending password reset with `ticket`.
    pub fn issue_password_reset(&mut self, ticket: PasswordResetTicket, now: DateTime<Utc>) {
        self.password_reset = Some(ticket);
        self.updated_at = now;
    }

    /// Records a successful login.
    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Returns the union of permissions across all loaded roles.
    #[must_use]
    pub fn permissions(&self) -> PermissionSet {
        self.roles
            .iter()
            .flat_map(|role| role.permissions().iter().cloned())
            .collect()
    }

    /// Returns whether any loaded role grants `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.roles.iter().any(|role| {
            role.permissions()
                .iter()
                .any(|granted| granted.matches(permission))
        })
    }

    /// Returns whether the user holds the role named `role_name`.
    #[must_use]
    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles.iter().any(|role| role.name() == role_name)
    }

    /// Returns whether the user holds at least one of `role_names`.
    #[must_use]
    pub fn has_any_role<S: AsRef<str>>(&self, role_names: &[S]) -> bool {
        role_names
            .iter()
            .any(|role_name| self.has_role(role_name.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::RoleId;
    use crate::security::Permission;

    fn role(name: &str, permissions: &[&str]) -> Role {
        let permissions = permissions
            .iter()
            .map(|value| Permission::parse(*value).unwrap_or_else(|_| panic!("test")))
            .collect();
        Role::new(RoleId::new(), name, name, None, permissions).unwrap_or_else(|_| panic!("test"))
    }

    fn user_with_roles(roles: Vec<Role>) -> User {
        let profile = UserProfile::new("pat").unwrap_or_else(|_| panic!("test"));
        User::new(UserId::new(), profile, Utc::now()).with_roles(roles)
    }

    #[test]
    fn valid_email_is_accepted() {
        let email = EmailAddress::new("USER@Example.COM");
        assert!(email.is_ok());
        let email = email.unwrap_or_else(|_| panic!("test"));
        assert_eq!(email.as_str(), "user@example.com");
        assert_eq!(email.local_part(), "user");
    }

    #[test]
    fn email_without_at_is_rejected() {
        assert!(EmailAddress::new("noatsign").is_err());
    }

    #[test]
    fn email_with_two_ats_is_rejected() {
        assert!(EmailAddress::new("a@b@example.com").is_err());
    }

    #[test]
    fn email_without_domain_dot_is_rejected() {
        assert!(EmailAddress::new("user@nodot").is_err());
    }

    #[test]
    fn status_parses_storage_values() {
        assert_eq!(UserStatus::from_str("suspended").ok(), Some(UserStatus::Suspended));
        assert!(UserStatus::from_str("banned").is_err());
        assert!(UserStatus::Active.is_active());
        assert!(!UserStatus::Inactive.is_active());
    }

    #[test]
    fn viewer_permissions_are_exact() {
        let user = user_with_roles(vec![role(
            "viewer",
            &["properties.read", "tenants.read", "maintenance.read"],
        )]);

        assert!(user.has_permission("properties.read"));
        assert!(!user.has_permission("properties.delete"));
        assert!(user.has_role("viewer"));
        assert!(!user.has_any_role(&["admin", "property_manager"][..]));
    }

    #[test]
    fn permissions_union_across_roles() {
        let user = user_with_roles(vec![
            role("tenant", &["profile.read", "maintenance.create.own"]),
            role("viewer", &["properties.read", "maintenance.read"]),
        ]);

        assert!(user.has_permission("profile.read"));
        assert!(user.has_permission("properties.read"));
        assert_eq!(user.permissions().len(), 4);
    }

    #[test]
    fn user_without_roles_has_no_permissions() {
        let user = user_with_roles(Vec::new());
        assert!(!user.has_permission("profile.read"));
        assert!(user.permissions().is_empty());
    }

    #[test]
    fn roles_are_ordered_by_name() {
        let user = user_with_roles(vec![role("viewer", &[]), role("admin", &[])]);
        let names: Vec<&str> = user.roles().iter().map(Role::name).collect();
        assert_eq!(names, ["admin", "viewer"]);
    }

    #[test]
    fn contact_fields_drop_blank_values() {
        let profile = UserProfile::new("pat")
            .unwrap_or_else(|_| panic!("test"))
            .with_contact(Some(" +1 555 0100 ".to_owned()), Some("  ".to_owned()));

        assert_eq!(profile.phone_number(), Some("+1 555 0100"));
        assert_eq!(profile.profile_picture_url(), None);
    }

    #[test]
    fn mfa_toggles_secret_and_flag() {
        let mut user = user_with_roles(Vec::new());
        assert!(!user.mfa_enabled());

        user.enable_mfa("JBSWY3DPEHPK3PXP", Utc::now());
        assert!(user.mfa_enabled());
        assert_eq!(user.mfa_secret(), Some("JBSWY3DPEHPK3PXP"));

        user.disable_mfa(Utc::now());
        assert!(!user.mfa_enabled());
        assert!(user.mfa_secret().is_none());
    }

    #[test]
    fn mfa_flag_without_secret_is_off() {
        let user = user_with_roles(Vec::new()).with_mfa(true, None);
        assert!(!user.mfa_enabled());
    }

    #[test]
    fn serialized_user_omits_secrets() {
        let mut user = user_with_roles(Vec::new());
        user.enable_mfa("JBSWY3DPEHPK3PXP", Utc::now());
        user.issue_password_reset(PasswordResetTicket::new("digest", Utc::now()), Utc::now());

        let json = serde_json::to_string(&user).unwrap_or_else(|_| panic!("test"));
        assert!(!json.contains("JBSWY3DPEHPK3PXP"));
        assert!(!json.contains("digest"));
        assert!(json.contains("\"mfa_enabled\":true"));
    }

    #[test]
    fn linking_sets_external_id() {
        let mut user = user_with_roles(Vec::new());
        user.link_external_id("kc-pat", Utc::now());
        assert_eq!(user.external_id(), Some("kc-pat"));
    }

    #[test]
    fn blank_username_is_rejected() {
        assert!(UserProfile::new("   ").is_err());
    }
}
