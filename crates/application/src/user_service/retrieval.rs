use pmaas_core::AppError;
use pmaas_domain::UserId;

use crate::UserListQuery;

use super::*;

impl UserService {
    /// Returns a user with roles loaded, if it exists.
    pub async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        match self.user_repository.find_by_id(user_id).await? {
            Some(user) => Ok(Some(self.with_roles(user).await?)),
            None => Ok(None),
        }
    }

    /// Returns a user with roles loaded.
    pub async fn get_user(&self, user_id: UserId) -> AppResult<User> {
        self.find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' not found")))
    }

    /// Lists users newest first, each with roles loaded.
    pub async fn list_users(&self, query: UserListQuery) -> AppResult<Vec<User>> {
        let users = self.user_repository.list(query).await?;
        let mut loaded = Vec::with_capacity(users.len());
        for user in users {
            loaded.push(self.with_roles(user).await?);
        }
        Ok(loaded)
    }
}
