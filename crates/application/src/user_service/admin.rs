use chrono::Utc;
use pmaas_domain::{EmailAddress, UserId, UserProfile};
use tracing::info;

use super::*;

impl UserService {
    /// Applies self-service profile changes for `user_id`.
    ///
    /// Changing the email address clears its verification flag. A blank
    /// phone number or picture URL clears the stored value.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        input: UpdateProfileInput,
    ) -> AppResult<User> {
        let mut user = self.get_user(user_id).await?;
        let current = user.profile();

        let (email, verified) = match non_blank(input.email) {
            Some(value) => {
                let email = EmailAddress::new(value)?;
                let verified = current.email() == Some(&email) && current.email_verified();
                (Some(email), verified)
            }
            None => (current.email().cloned(), current.email_verified()),
        };

        let phone_number = input
            .phone_number
            .or_else(|| current.phone_number().map(str::to_owned));
        let profile_picture_url = input
            .profile_picture_url
            .or_else(|| current.profile_picture_url().map(str::to_owned));
        let profile = UserProfile::new(current.username())?
            .with_email(email, verified)
            .with_names(
                non_blank(input.first_name).or_else(|| current.first_name().map(str::to_owned)),
                non_blank(input.last_name).or_else(|| current.last_name().map(str::to_owned)),
            )
            .with_contact(phone_number, profile_picture_url);

        user.update_profile(profile, Utc::now());
        self.user_repository.update(&user).await?;
        Ok(user)
    }

    /// Applies administrative changes, including status, for `user_id`.
    pub async fn update_user(&self, user_id: UserId, input: UpdateUserInput) -> AppResult<User> {
        let mut user = self.get_user(user_id).await?;
        let now = Utc::now();
        let current = user.profile();

        let email = match non_blank(input.email) {
            Some(value) => Some(EmailAddress::new(value)?),
            None => current.email().cloned(),
        };
        let verified = input.email_verified.unwrap_or(current.email_verified());
        let username = non_blank(input.username).unwrap_or_else(|| current.username().to_owned());

        let profile = UserProfile::new(username)?
            .with_email(email, verified)
            .with_names(
                non_blank(input.first_name).or_else(|| current.first_name().map(str::to_owned)),
                non_blank(input.last_name).or_else(|| current.last_name().map(str::to_owned)),
            )
            .with_contact(
                current.phone_number().map(str::to_owned),
                current.profile_picture_url().map(str::to_owned),
            );

        user.update_profile(profile, now);
        if let Some(status) = input.status {
            user.change_status(status, now);
        }

        self.user_repository.update(&user).await?;
        info!(user_id = %user_id, status = user.status().as_str(), "user updated");
        Ok(user)
    }

    /// Deletes a user together with its assignments and sessions.
    pub async fn delete_user(&self, user_id: UserId) -> AppResult<()> {
        self.user_repository.delete(user_id).await?;
        info!(user_id = %user_id, "user deleted");
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim().to_owned();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}
