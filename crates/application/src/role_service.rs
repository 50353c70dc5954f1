use std::sync::Arc;

use pmaas_core::{AppError, AppResult};
use pmaas_domain::{Role, RoleId, UserId};

use crate::RoleRepository;

/// Application service over role definitions and assignments.
#[derive(Clone)]
pub struct RoleService {
    repository: Arc<dyn RoleRepository>,
}

impl RoleService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleRepository>) -> Self {
        Self { repository }
    }

    /// Returns the role named `name`.
    pub async fn get_role_by_name(&self, name: &str) -> AppResult<Role> {
        self.repository
            .find_role_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{name}' does not exist")))
    }

    /// Returns the role with identifier `role_id`.
    pub async fn get_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.repository
            .find_role_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    /// Lists all roles ordered by name.
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.repository.list_roles().await
    }

    /// Assigns a role. A repeated assignment fails with `AppError::Conflict`.
    pub async fn assign_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        assigned_by: Option<UserId>,
    ) -> AppResult<()> {
        self.repository
            .assign_role(user_id, role_id, assigned_by)
            .await
    }

    /// Removes a role assignment if present.
    pub async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        self.repository.remove_role(user_id, role_id).await
    }

    /// Lists a user's roles ordered by name.
    pub async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        self.repository.list_user_roles(user_id).await
    }

    /// Replaces all of a user's assignments with `role_ids` atomically.
    pub async fn replace_user_roles(&self, user_id: UserId, role_ids: &[RoleId]) -> AppResult<()> {
        self.repository.replace_user_roles(user_id, role_ids).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pmaas_domain::{SystemRole, UserId};

    use super::RoleService;
    use crate::test_support::InMemoryStore;

    #[tokio::test]
    async fn assigning_twice_conflicts_and_keeps_one_row() {
        let store = Arc::new(InMemoryStore::seeded());
        let service = RoleService::new(store.clone());
        let user_id = store.insert_user("pat").await;
        let viewer = service
            .get_role_by_name(SystemRole::Viewer.as_str())
            .await
            .unwrap_or_else(|_| panic!("seeded role"));

        assert!(service.assign_role(user_id, viewer.id(), None).await.is_ok());
        let second = service.assign_role(user_id, viewer.id(), None).await;
        assert!(second.as_ref().is_err_and(|error| error.is_conflict()));

        let roles = service.list_user_roles(user_id).await.unwrap_or_default();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name(), "viewer");
    }

    #[tokio::test]
    async fn removing_twice_succeeds() {
        let store = Arc::new(InMemoryStore::seeded());
        let service = RoleService::new(store.clone());
        let user_id = store.insert_user("pat").await;
        let tenant = service
            .get_role_by_name("tenant")
            .await
            .unwrap_or_else(|_| panic!("seeded role"));

        assert!(service.assign_role(user_id, tenant.id(), None).await.is_ok());
        assert!(service.remove_role(user_id, tenant.id()).await.is_ok());
        assert!(service.remove_role(user_id, tenant.id()).await.is_ok());
        assert!(
            service
                .list_user_roles(user_id)
                .await
                .unwrap_or_default()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn assigning_to_unknown_user_is_not_found() {
        let store = Arc::new(InMemoryStore::seeded());
        let service = RoleService::new(store.clone());
        let admin = service
            .get_role_by_name("admin")
            .await
            .unwrap_or_else(|_| panic!("seeded role"));

        let result = service.assign_role(UserId::new(), admin.id(), None).await;
        assert!(result.is_err_and(|error| error.is_not_found()));
    }

    #[tokio::test]
    async fn unknown_role_name_is_not_found() {
        let service = RoleService::new(Arc::new(InMemoryStore::seeded()));
        let result = service.get_role_by_name("superuser").await;
        assert!(result.is_err_and(|error| error.is_not_found()));
    }

    #[tokio::test]
    async fn user_roles_are_ordered_by_name() {
        let store = Arc::new(InMemoryStore::seeded());
        let service = RoleService::new(store.clone());
        let user_id = store.insert_user("pat").await;

        for name in ["viewer", "admin", "tenant"] {
            let role = service
                .get_role_by_name(name)
                .await
                .unwrap_or_else(|_| panic!("seeded role"));
            assert!(service.assign_role(user_id, role.id(), None).await.is_ok());
        }

        let names: Vec<String> = service
            .list_user_roles(user_id)
            .await
            .unwrap_or_default()
            .iter()
            .map(|role| role.name().to_owned())
            .collect();
        assert_eq!(names, ["admin", "tenant", "viewer"]);
    }

    #[tokio::test]
    async fn list_roles_returns_all_seeded_roles_by_name() {
        let service = RoleService::new(Arc::new(InMemoryStore::seeded()));
        let names: Vec<String> = service
            .list_roles()
            .await
            .unwrap_or_default()
            .iter()
            .map(|role| role.name().to_owned())
            .collect();
        assert_eq!(names, ["admin", "property_manager", "tenant", "viewer"]);
    }
}
