use chrono::{DateTime, Duration, Utc};
use pmaas_domain::{EmailAddress, PasswordResetTicket, UserId};
use tracing::{debug, info};

use super::*;
use crate::token_crypto::generate_token;

/// Lifetime of a password reset token.
pub const PASSWORD_RESET_TTL_HOURS: i64 = 24;

/// A stored reset ticket together with the raw token for delivery.
#[derive(Debug, Clone)]
pub struct IssuedPasswordReset {
    /// Account the token was issued for.
    pub user_id: UserId,
    /// Raw token; only its hash is stored.
    pub token: String,
    /// Expiry of the token.
    pub expires_at: DateTime<Utc>,
}

impl UserService {
    /// Issues a reset token for the account holding `email`, replacing any
    /// earlier one.
    ///
    /// Unknown or malformed addresses yield `Ok(None)` so callers can answer
    /// identically whether or not the account exists.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> AppResult<Option<IssuedPasswordReset>> {
        let Ok(email) = EmailAddress::new(email) else {
            debug!("password reset requested for a malformed address");
            return Ok(None);
        };
        let Some(mut user) = self.user_repository.find_by_email(&email).await? else {
            debug!("password reset requested for an unknown address");
            return Ok(None);
        };

        let (token, token_hash) = generate_token()?;
        let now = Utc::now();
        let expires_at = now + Duration::hours(PASSWORD_RESET_TTL_HOURS);
        user.issue_password_reset(PasswordResetTicket::new(token_hash, expires_at), now);
        self.user_repository.update(&user).await?;

        info!(user_id = %user.id(), %expires_at, "password reset token issued");
        Ok(Some(IssuedPasswordReset {
            user_id: user.id(),
            token,
            expires_at,
        }))
    }
}
