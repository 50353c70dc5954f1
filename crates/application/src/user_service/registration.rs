use chrono::Utc;
use pmaas_domain::{EmailAddress, SystemRole, UserId, UserProfile};
use tracing::{info, warn};

use super::*;

impl UserService {
    /// Registers a user directly and grants the default role.
    ///
    /// Duplicate usernames or emails fail with `AppError::Conflict`.
    pub async fn register(&self, input: RegisterUserInput) -> AppResult<User> {
        let email = EmailAddress::new(input.email)?;
        let profile = UserProfile::new(input.username)?
            .with_email(Some(email), false)
            .with_names(input.first_name, input.last_name);

        let user = User::new(UserId::new(), profile, Utc::now());
        self.user_repository.create(&user).await?;

        match self
            .role_service
            .get_role_by_name(SystemRole::DEFAULT.as_str())
            .await
        {
            Ok(role) => {
                if let Err(error) = self.role_service.assign_role(user.id(), role.id(), None).await
                    && !error.is_conflict()
                {
                    warn!(user_id = %user.id(), error = %error, "failed to assign default role");
                }
            }
            Err(error) => {
                warn!(user_id = %user.id(), error = %error, "default role is unavailable");
            }
        }

        info!(user_id = %user.id(), username = user.username(), "user registered");
        self.with_roles(user).await
    }
}
