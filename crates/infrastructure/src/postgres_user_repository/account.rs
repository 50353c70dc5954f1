use super::*;

impl PostgresUserRepository {
    pub(super) async fn create_impl(&self, user: &User) -> AppResult<()> {
        let profile = user.profile();

        sqlx::query(
            r#"
            INSERT INTO users (
                id, external_id, username, email, first_name, last_name,
                phone_number, profile_picture_url, status, email_verified,
                mfa_enabled, mfa_secret, last_login_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.external_id())
        .bind(profile.username())
        .bind(profile.email().map(EmailAddress::as_str))
        .bind(profile.first_name())
        .bind(profile.last_name())
        .bind(profile.phone_number())
        .bind(profile.profile_picture_url())
        .bind(user.status().as_str())
        .bind(profile.email_verified())
        .bind(user.mfa_enabled())
        .bind(user.mfa_secret())
        .bind(user.last_login_at())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| user_conflict_or_internal(error, "create user"))?;

        Ok(())
    }

    pub(super) async fn update_impl(&self, user: &User) -> AppResult<()> {
        let profile = user.profile();

        let result = sqlx::query(
            r#"
            UPDATE users
            SET external_id = $2,
                username = $3,
                email = $4,
                first_name = $5,
                last_name = $6,
                phone_number = $7,
                profile_picture_url = $8,
                status = $9,
                email_verified = $10,
                mfa_enabled = $11,
                mfa_secret = $12,
                password_reset_token_hash = $13,
                password_reset_expires_at = $14,
                last_login_at = $15,
                updated_at = $16
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.external_id())
        .bind(profile.username())
        .bind(profile.email().map(EmailAddress::as_str))
        .bind(profile.first_name())
        .bind(profile.last_name())
        .bind(profile.phone_number())
        .bind(profile.profile_picture_url())
        .bind(user.status().as_str())
        .bind(profile.email_verified())
        .bind(user.mfa_enabled())
        .bind(user.mfa_secret())
        .bind(user.password_reset().map(PasswordResetTicket::token_hash))
        .bind(user.password_reset().map(PasswordResetTicket::expires_at))
        .bind(user.last_login_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| user_conflict_or_internal(error, "update user"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user '{}' not found", user.id())));
        }

        Ok(())
    }

    pub(super) async fn delete_impl(&self, user_id: UserId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete user: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user '{user_id}' not found")));
        }

        Ok(())
    }
}
