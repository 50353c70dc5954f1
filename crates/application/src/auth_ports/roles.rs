use async_trait::async_trait;
use pmaas_core::AppResult;
use pmaas_domain::{Role, RoleId, UserId};

/// Repository port for role definitions and user role assignments.
///
/// Implementations must not cache: every call reflects committed state.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Finds a role by its unique name.
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// Finds a role by identifier.
    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Lists all roles ordered by name.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Assigns a role to a user.
    ///
    /// Returns `AppError::Conflict` if the pair already exists and
    /// `AppError::NotFound` if either identifier is dangling.
    async fn assign_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        assigned_by: Option<UserId>,
    ) -> AppResult<()>;

    /// Removes a role assignment. Removing a missing assignment succeeds.
    async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()>;

    /// Lists the roles assigned to a user ordered by role name.
    async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<Role>>;

    /// Replaces every assignment of a user with exactly `role_ids` in one transaction.
    async fn replace_user_roles(&self, user_id: UserId, role_ids: &[RoleId]) -> AppResult<()>;
}
