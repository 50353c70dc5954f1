use chrono::{DateTime, Utc};
use pmaas_core::{AppError, AppResult, IdentityClaims};
use pmaas_domain::{EmailAddress, User, UserId, UserProfile};
use tracing::{debug, info, warn};

use super::IdentityResolver;

const SUBJECT_SUFFIX_LEN: usize = 8;

impl IdentityResolver {
    /// Returns the local account for the provider subject, creating or
    /// linking one when the subject is new.
    ///
    /// A create that collides with an existing username or email never fails
    /// the login: an unlinked account with the same verified email is linked,
    /// anything else gets a derived username.
    pub(super) async fn find_or_create(&self, claims: &IdentityClaims) -> AppResult<User> {
        let subject = claims.subject().trim();
        if subject.is_empty() {
            return Err(AppError::Unauthorized(
                "identity token carries no subject".to_owned(),
            ));
        }

        let now = Utc::now();
        if let Some(user) = self.user_repository.find_by_external_id(subject).await? {
            return self.refresh_on_login(user, claims, now).await;
        }

        let profile = profile_from_claims(claims)?;
        match self.create_federated(profile.clone(), subject, now).await {
            Err(error) if error.is_conflict() => {
                debug!(subject, error = %error, "first federated login collided with an existing user");
            }
            outcome => return outcome,
        }

        // Another request may have provisioned the same subject meanwhile.
        if let Some(user) = self.user_repository.find_by_external_id(subject).await? {
            return Ok(user);
        }

        if let Some(mut user) = self.linkable_account(claims).await? {
            user.link_external_id(subject, now);
            info!(
                user_id = %user.id(),
                subject,
                "linked provider identity to existing account by verified email"
            );
            return self.refresh_on_login(user, claims, now).await;
        }

        let mut last_error = None;
        for username in fallback_usernames(profile.username(), subject) {
            let fallback = self.disambiguated(&profile, username).await?;
            match self.create_federated(fallback, subject, now).await {
                Ok(user) => {
                    warn!(
                        user_id = %user.id(),
                        subject,
                        username = user.username(),
                        "claimed username or email is taken, provisioned with a derived username"
                    );
                    return Ok(user);
                }
                Err(error) if error.is_conflict() => last_error = Some(error),
                Err(error) => return Err(error),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::Conflict(format!("could not provision a user for subject '{subject}'"))
        }))
    }

    async fn create_federated(
        &self,
        profile: UserProfile,
        subject: &str,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        let mut user =
            User::new(UserId::new(), profile, now).with_external_id(Some(subject.to_owned()));
        user.record_login(now);
        self.user_repository.create(&user).await?;

        debug!(user_id = %user.id(), "created user on first federated login");
        Ok(user)
    }

    /// Applies the claimed profile and login timestamp. When the claimed email
    /// belongs to another account the stored email is kept.
    async fn refresh_on_login(
        &self,
        mut user: User,
        claims: &IdentityClaims,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        let previous = user.profile().clone();
        let refreshed = refreshed_profile(&previous, claims)?;
        if refreshed != previous {
            user.update_profile(refreshed, now);
        }
        user.record_login(now);

        match self.user_repository.update(&user).await {
            Err(error) if error.is_conflict() && user.profile().email() != previous.email() => {
                warn!(
                    user_id = %user.id(),
                    error = %error,
                    "claimed email belongs to another account, keeping the stored email"
                );
                let kept = user
                    .profile()
                    .clone()
                    .with_email(previous.email().cloned(), previous.email_verified());
                user.update_profile(kept, now);
                self.user_repository.update(&user).await?;
                Ok(user)
            }
            outcome => outcome.map(|()| user),
        }
    }

    async fn linkable_account(&self, claims: &IdentityClaims) -> AppResult<Option<User>> {
        if !claims.email_verified() {
            return Ok(None);
        }
        let Some(email) = claimed_email(claims) else {
            return Ok(None);
        };

        Ok(self
            .user_repository
            .find_by_email(&email)
            .await?
            .filter(|user| user.external_id().is_none()))
    }

    /// Copies `profile` under `username`, dropping the email when another
    /// account already holds it.
    async fn disambiguated(&self, profile: &UserProfile, username: String) -> AppResult<UserProfile> {
        let email_taken = match profile.email() {
            Some(email) => self.user_repository.find_by_email(email).await?.is_some(),
            None => false,
        };
        let (email, verified) = if email_taken {
            (None, false)
        } else {
            (profile.email().cloned(), profile.email_verified())
        };

        Ok(UserProfile::new(username)?
            .with_email(email, verified)
            .with_names(
                profile.first_name().map(str::to_owned),
                profile.last_name().map(str::to_owned),
            ))
    }
}

/// Candidate usernames for a colliding first login: one stable per subject,
/// then one random.
fn fallback_usernames(base: &str, subject: &str) -> [String; 2] {
    let stable: String = subject
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(SUBJECT_SUFFIX_LEN)
        .collect::<String>()
        .to_lowercase();
    let stable = if stable.is_empty() {
        random_suffix()
    } else {
        stable
    };

    [
        format!("{base}-{stable}"),
        format!("{base}-{}", random_suffix()),
    ]
}

fn random_suffix() -> String {
    UserId::new().as_uuid().simple().to_string()[..SUBJECT_SUFFIX_LEN].to_owned()
}

fn claimed_email(claims: &IdentityClaims) -> Option<EmailAddress> {
    claims
        .email()
        .and_then(|value| EmailAddress::new(value).ok())
}

fn profile_from_claims(claims: &IdentityClaims) -> AppResult<UserProfile> {
    let email = claimed_email(claims);
    let username = claims
        .preferred_username()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .or_else(|| email.as_ref().map(|email| email.local_part().to_owned()))
        .unwrap_or_else(|| claims.subject().trim().to_owned());

    Ok(UserProfile::new(username)?
        .with_email(email, claims.email_verified())
        .with_names(
            claims.given_name().map(str::to_owned),
            claims.family_name().map(str::to_owned),
        ))
}

fn refreshed_profile(current: &UserProfile, claims: &IdentityClaims) -> AppResult<UserProfile> {
    let (email, verified) = match claimed_email(claims) {
        Some(email) => (Some(email), claims.email_verified()),
        None => (current.email().cloned(), current.email_verified()),
    };

    let first_name = claims
        .given_name()
        .or(current.first_name())
        .map(str::to_owned);
    let last_name = claims
        .family_name()
        .or(current.last_name())
        .map(str::to_owned);

    Ok(UserProfile::new(current.username())?
        .with_email(email, verified)
        .with_names(first_name, last_name)
        .with_contact(
            current.phone_number().map(str::to_owned),
            current.profile_picture_url().map(str::to_owned),
        ))
}
