use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pmaas_core::{AppError, AppResult};
use pmaas_domain::{
    EmailAddress, Permission, Role, RoleId, SystemRole, User, UserId, UserProfile, UserSession,
};
use tokio::sync::Mutex;

use crate::{RoleRepository, SessionRepository, UserListQuery, UserRepository};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    roles: Vec<Role>,
    assignments: Vec<(UserId, RoleId)>,
    sessions: Vec<UserSession>,
    failing_roles: HashSet<RoleId>,
    fail_replace: bool,
    replace_calls: usize,
}

/// In-memory implementation of every store port, with failure injection.
#[derive(Default)]
pub(crate) struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub(crate) fn seeded() -> Self {
        let roles = SystemRole::all()
            .iter()
            .map(|system_role| {
                let permissions = system_role
                    .seed_permissions()
                    .iter()
                    .map(|value| Permission::parse(*value).unwrap_or_else(|_| panic!("seed")))
                    .collect();
                Role::new(
                    RoleId::new(),
                    system_role.as_str(),
                    system_role.display_name(),
                    None,
                    permissions,
                )
                .unwrap_or_else(|_| panic!("seed"))
            })
            .collect();

        Self {
            state: Mutex::new(State {
                roles,
                ..State::default()
            }),
        }
    }

    pub(crate) async fn insert_user(&self, username: &str) -> UserId {
        let profile = UserProfile::new(username).unwrap_or_else(|_| panic!("username"));
        let user = User::new(UserId::new(), profile, Utc::now());
        let user_id = user.id();
        self.state.lock().await.users.insert(user_id, user);
        user_id
    }

    pub(crate) async fn insert_registered(&self, username: &str, email: &str) -> UserId {
        let email = EmailAddress::new(email).unwrap_or_else(|_| panic!("email"));
        let profile = UserProfile::new(username)
            .unwrap_or_else(|_| panic!("username"))
            .with_email(Some(email), false);
        let user = User::new(UserId::new(), profile, Utc::now());
        let user_id = user.id();
        self.state.lock().await.users.insert(user_id, user);
        user_id
    }

    pub(crate) async fn stored_user(&self, user_id: UserId) -> User {
        self.state
            .lock()
            .await
            .users
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| panic!("unknown user {user_id}"))
    }

    pub(crate) async fn role_id(&self, name: &str) -> RoleId {
        self.state
            .lock()
            .await
            .roles
            .iter()
            .find(|role| role.name() == name)
            .map(Role::id)
            .unwrap_or_else(|| panic!("unknown role {name}"))
    }

    pub(crate) async fn fail_writes_for_role(&self, name: &str) {
        let role_id = self.role_id(name).await;
        self.state.lock().await.failing_roles.insert(role_id);
    }

    pub(crate) async fn fail_replace(&self) {
        self.state.lock().await.fail_replace = true;
    }

    pub(crate) async fn replace_calls(&self) -> usize {
        self.state.lock().await.replace_calls
    }

    pub(crate) async fn role_names(&self, user_id: UserId) -> Vec<String> {
        self.list_user_roles(user_id)
            .await
            .unwrap_or_default()
            .iter()
            .map(|role| role.name().to_owned())
            .collect()
    }

    pub(crate) async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    pub(crate) async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: &User) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let duplicate = state.users.values().any(|existing| {
            existing.username() == user.username()
                || (existing.external_id().is_some() && existing.external_id() == user.external_id())
                || (existing.profile().email().is_some()
                    && existing.profile().email() == user.profile().email())
        });
        if duplicate {
            return Err(AppError::Conflict("user already exists".to_owned()));
        }

        state.users.insert(user.id(), user.clone().with_roles(Vec::new()));
        Ok(())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<User>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|user| user.external_id() == Some(external_id))
            .cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<User>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|user| user.profile().email() == Some(email))
            .cloned())
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let clashes = state.users.values().any(|existing| {
            existing.id() != user.id()
                && (existing.username() == user.username()
                    || (existing.profile().email().is_some()
                        && existing.profile().email() == user.profile().email()))
        });
        if clashes {
            return Err(AppError::Conflict("username or email taken".to_owned()));
        }
        match state.users.get_mut(&user.id()) {
            Some(existing) => {
                *existing = user.clone().with_roles(Vec::new());
                Ok(())
            }
            None => Err(AppError::NotFound(format!("user '{}' not found", user.id()))),
        }
    }

    async fn delete(&self, user_id: UserId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.users.remove(&user_id).is_none() {
            return Err(AppError::NotFound(format!("user '{user_id}' not found")));
        }
        state.assignments.retain(|(owner, _)| *owner != user_id);
        state.sessions.retain(|session| session.user_id() != user_id);
        Ok(())
    }

    async fn list(&self, query: UserListQuery) -> AppResult<Vec<User>> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        Ok(users
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .iter()
            .find(|role| role.name() == name)
            .cloned())
    }

    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .iter()
            .find(|role| role.id() == role_id)
            .cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles = self.state.lock().await.roles.clone();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn assign_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        _assigned_by: Option<UserId>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.failing_roles.contains(&role_id) {
            return Err(AppError::Internal("injected assign failure".to_owned()));
        }
        if !state.users.contains_key(&user_id) || !state.roles.iter().any(|role| role.id() == role_id)
        {
            return Err(AppError::NotFound("user or role not found".to_owned()));
        }
        if state.assignments.contains(&(user_id, role_id)) {
            return Err(AppError::Conflict("role already assigned".to_owned()));
        }
        state.assignments.push((user_id, role_id));
        Ok(())
    }

    async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.failing_roles.contains(&role_id) {
            return Err(AppError::Internal("injected remove failure".to_owned()));
        }
        state
            .assignments
            .retain(|assignment| *assignment != (user_id, role_id));
        Ok(())
    }

    async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let state = self.state.lock().await;
        let mut roles: Vec<Role> = state
            .roles
            .iter()
            .filter(|role| state.assignments.contains(&(user_id, role.id())))
            .cloned()
            .collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn replace_user_roles(&self, user_id: UserId, role_ids: &[RoleId]) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.replace_calls += 1;
        if state.fail_replace {
            return Err(AppError::Internal("injected replace failure".to_owned()));
        }
        if !state.users.contains_key(&user_id) {
            return Err(AppError::NotFound(format!("user '{user_id}' not found")));
        }
        state.assignments.retain(|(owner, _)| *owner != user_id);
        for role_id in role_ids {
            if !state.assignments.contains(&(user_id, *role_id)) {
                state.assignments.push((user_id, *role_id));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn create_session(&self, session: &UserSession) -> AppResult<()> {
        self.state.lock().await.sessions.push(session.clone());
        Ok(())
    }

    async fn find_active_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<UserSession>> {
        Ok(self
            .state
            .lock()
            .await
            .sessions
            .iter()
            .find(|session| session.token_hash() == token_hash && session.is_valid_at(now))
            .cloned())
    }

    async fn delete_session(&self, token_hash: &str) -> AppResult<()> {
        self.state
            .lock()
            .await
            .sessions
            .retain(|session| session.token_hash() != token_hash);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|session| session.is_valid_at(now));
        Ok((before - state.sessions.len()) as u64)
    }
}
