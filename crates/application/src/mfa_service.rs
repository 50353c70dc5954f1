//! Self-service TOTP second factor.

use std::sync::Arc;

use chrono::Utc;
use pmaas_core::{AppError, AppResult};
use pmaas_domain::{User, UserId};
use tracing::info;

use crate::{TotpEnrollment, TotpProvider, UserRepository};

#[cfg(test)]
mod tests;

/// Application service for enabling, disabling and checking TOTP codes.
#[derive(Clone)]
pub struct MfaService {
    user_repository: Arc<dyn UserRepository>,
    totp_provider: Arc<dyn TotpProvider>,
}

impl MfaService {
    /// Creates a new MFA service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        totp_provider: Arc<dyn TotpProvider>,
    ) -> Self {
        Self {
            user_repository,
            totp_provider,
        }
    }

    /// Generates and stores a secret, turning MFA on immediately.
    ///
    /// Fails with `AppError::Conflict` when MFA is already enabled.
    pub async fn enable(&self, user_id: UserId) -> AppResult<TotpEnrollment> {
        let mut user = self.load(user_id).await?;
        if user.mfa_enabled() {
            return Err(AppError::Conflict("MFA is already enabled".to_owned()));
        }

        let account_name = user
            .profile()
            .email()
            .map_or_else(|| user.username().to_owned(), |email| email.as_str().to_owned());
        let enrollment = self.totp_provider.generate(&account_name)?;

        user.enable_mfa(enrollment.secret.clone(), Utc::now());
        self.user_repository.update(&user).await?;

        info!(user_id = %user_id, "MFA enabled");
        Ok(enrollment)
    }

    /// Turns MFA off after checking a current code.
    pub async fn disable(&self, user_id: UserId, code: &str) -> AppResult<()> {
        let mut user = self.load(user_id).await?;
        if !self.check(&user, code)? {
            return Err(AppError::Unauthorized("invalid MFA code".to_owned()));
        }

        user.disable_mfa(Utc::now());
        self.user_repository.update(&user).await?;

        info!(user_id = %user_id, "MFA disabled");
        Ok(())
    }

    /// Returns whether `code` is currently valid for the user.
    pub async fn verify(&self, user_id: UserId, code: &str) -> AppResult<bool> {
        let user = self.load(user_id).await?;
        self.check(&user, code)
    }

    fn check(&self, user: &User, code: &str) -> AppResult<bool> {
        match user.mfa_secret() {
            Some(secret) if user.mfa_enabled() => self.totp_provider.verify_code(secret, code.trim()),
            _ => Err(AppError::Validation("MFA is not enabled".to_owned())),
        }
    }

    async fn load(&self, user_id: UserId) -> AppResult<User> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' not found")))
    }
}
