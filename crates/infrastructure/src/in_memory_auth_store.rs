use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pmaas_application::{RoleRepository, SessionRepository, UserListQuery, UserRepository};
use pmaas_core::{AppError, AppResult};
use pmaas_domain::{
    EmailAddress, Permission, Role, RoleId, SystemRole, User, UserId, UserSession,
};
use tokio::sync::RwLock;

/// In-memory implementation of the user, role and session ports.
///
/// Enforces the same uniqueness and referential rules as the PostgreSQL
/// schema. Locks are always taken in field order.
#[derive(Debug, Default)]
pub struct InMemoryAuthStore {
    users: RwLock<HashMap<UserId, User>>,
    roles: RwLock<HashMap<RoleId, Role>>,
    assignments: RwLock<HashMap<(UserId, RoleId), Option<UserId>>>,
    sessions: RwLock<HashMap<String, UserSession>>,
}

impl InMemoryAuthStore {
    /// Creates an empty store without any roles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the four system roles.
    pub fn with_system_roles() -> AppResult<Self> {
        let mut roles = HashMap::new();
        for system_role in SystemRole::all() {
            let permissions = system_role
                .seed_permissions()
                .iter()
                .map(|value| Permission::parse(*value))
                .collect::<AppResult<Vec<_>>>()?;
            let role = Role::new(
                RoleId::new(),
                system_role.as_str(),
                system_role.display_name(),
                None,
                permissions,
            )?;
            roles.insert(role.id(), role);
        }

        Ok(Self {
            roles: RwLock::new(roles),
            ..Self::default()
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryAuthStore {
    async fn create(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.write().await;

        let duplicate = users.values().any(|existing| {
            existing.id() == user.id()
                || existing.username() == user.username()
                || (existing.external_id().is_some()
                    && existing.external_id() == user.external_id())
                || (existing.profile().email().is_some()
                    && existing.profile().email() == user.profile().email())
        });
        if duplicate {
            return Err(AppError::Conflict(
                "a user with this identity, username or email already exists".to_owned(),
            ));
        }

        users.insert(user.id(), user.clone().with_roles(Vec::new()));
        Ok(())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.external_id() == Some(external_id))
            .cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.profile().email() == Some(email))
            .cloned())
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.write().await;

        let clashes = users.values().any(|existing| {
            existing.id() != user.id()
                && (existing.username() == user.username()
                    || (existing.external_id().is_some()
                        && existing.external_id() == user.external_id())
                    || (existing.profile().email().is_some()
                        && existing.profile().email() == user.profile().email()))
        });
        if clashes {
            return Err(AppError::Conflict(
                "a user with this username or email already exists".to_owned(),
            ));
        }

        match users.get_mut(&user.id()) {
            Some(existing) => {
                *existing = user.clone().with_roles(Vec::new());
                Ok(())
            }
            None => Err(AppError::NotFound(format!("user '{}' not found", user.id()))),
        }
    }

    async fn delete(&self, user_id: UserId) -> AppResult<()> {
        let mut users = self.users.write().await;
        if users.remove(&user_id).is_none() {
            return Err(AppError::NotFound(format!("user '{user_id}' not found")));
        }

        self.assignments
            .write()
            .await
            .retain(|(owner, _), _| *owner != user_id);
        self.sessions
            .write()
            .await
            .retain(|_, session| session.user_id() != user_id);
        Ok(())
    }

    async fn list(&self, query: UserListQuery) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|left, right| {
            right
                .created_at()
                .cmp(&left.created_at())
                .then_with(|| left.id().as_uuid().cmp(&right.id().as_uuid()))
        });

        Ok(users
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }
}

#[async_trait]
impl RoleRepository for InMemoryAuthStore {
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .values()
            .find(|role| role.name() == name)
            .cloned())
    }

    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&role_id).cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.roles.read().await.values().cloned().collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn assign_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        assigned_by: Option<UserId>,
    ) -> AppResult<()> {
        let users = self.users.read().await;
        let roles = self.roles.read().await;
        if !users.contains_key(&user_id) || !roles.contains_key(&role_id) {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' or role '{role_id}' does not exist"
            )));
        }

        let mut assignments = self.assignments.write().await;
        if assignments.contains_key(&(user_id, role_id)) {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' is already assigned to user '{user_id}'"
            )));
        }

        assignments.insert((user_id, role_id), assigned_by);
        Ok(())
    }

    async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        self.assignments.write().await.remove(&(user_id, role_id));
        Ok(())
    }

    async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let roles = self.roles.read().await;
        let assignments = self.assignments.read().await;

        let mut assigned: Vec<Role> = assignments
            .keys()
            .filter(|(owner, _)| *owner == user_id)
            .filter_map(|(_, role_id)| roles.get(role_id).cloned())
            .collect();
        assigned.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(assigned)
    }

    async fn replace_user_roles(&self, user_id: UserId, role_ids: &[RoleId]) -> AppResult<()> {
        let users = self.users.read().await;
        let roles = self.roles.read().await;
        if !users.contains_key(&user_id) {
            return Err(AppError::NotFound(format!("user '{user_id}' not found")));
        }
        if let Some(missing) = role_ids.iter().find(|role_id| !roles.contains_key(role_id)) {
            return Err(AppError::NotFound(format!("role '{missing}' not found")));
        }

        let mut assignments = self.assignments.write().await;
        assignments.retain(|(owner, _), _| *owner != user_id);
        for role_id in role_ids {
            assignments.insert((user_id, *role_id), None);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemoryAuthStore {
    async fn create_session(&self, session: &UserSession) -> AppResult<()> {
        if !self.users.read().await.contains_key(&session.user_id()) {
            return Err(AppError::NotFound(format!(
                "user '{}' not found",
                session.user_id()
            )));
        }

        self.sessions
            .write()
            .await
            .insert(session.token_hash().to_owned(), session.clone());
        Ok(())
    }

    async fn find_active_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<UserSession>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(token_hash)
            .filter(|session| session.is_valid_at(now))
            .cloned())
    }

    async fn delete_session(&self, token_hash: &str) -> AppResult<()> {
        self.sessions.write().await.remove(token_hash);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.is_valid_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use pmaas_application::{RoleRepository, SessionRepository, UserRepository};
    use pmaas_domain::{SystemRole, User, UserId, UserProfile, UserSession};

    use super::InMemoryAuthStore;

    fn store() -> InMemoryAuthStore {
        InMemoryAuthStore::with_system_roles().unwrap_or_else(|error| panic!("seed: {error}"))
    }

    async fn user(store: &InMemoryAuthStore, username: &str) -> UserId {
        let profile =
            UserProfile::new(username).unwrap_or_else(|error| panic!("profile: {error}"));
        let user = User::new(UserId::new(), profile, Utc::now());
        assert!(store.create(&user).await.is_ok());
        user.id()
    }

    #[tokio::test]
    async fn assignment_rules_match_the_database() {
        let store = store();
        let user_id = user(&store, "pat").await;
        let viewer = store
            .find_role_by_name(SystemRole::Viewer.as_str())
            .await
            .ok()
            .flatten()
            .map(|role| role.id())
            .unwrap_or_else(|| panic!("viewer role missing"));

        assert!(store.assign_role(user_id, viewer, None).await.is_ok());
        assert!(
            store
                .assign_role(user_id, viewer, None)
                .await
                .is_err_and(|error| error.is_conflict())
        );
        assert!(
            store
                .assign_role(UserId::new(), viewer, None)
                .await
                .is_err_and(|error| error.is_not_found())
        );
        assert_eq!(store.list_user_roles(user_id).await.unwrap_or_default().len(), 1);

        assert!(store.remove_role(user_id, viewer).await.is_ok());
        assert!(store.remove_role(user_id, viewer).await.is_ok());
        assert!(store.list_user_roles(user_id).await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_sessions() {
        let store = store();
        let user_id = user(&store, "pat").await;
        let now = Utc::now();
        let session = UserSession::new(
            uuid::Uuid::new_v4(),
            user_id,
            "hash",
            now + Duration::hours(1),
            now,
        );
        assert!(store.create_session(&session).await.is_ok());
        assert!(matches!(
            store.find_active_session("hash", now).await,
            Ok(Some(_))
        ));

        assert!(store.delete(user_id).await.is_ok());
        assert!(matches!(
            store.find_active_session("hash", now).await,
            Ok(None)
        ));
        assert_eq!(store.list_roles().await.unwrap_or_default().len(), 4);
    }
}
