//! PostgreSQL-backed role store.

use async_trait::async_trait;
use sqlx::PgPool;

use pmaas_application::RoleRepository;
use pmaas_core::{AppError, AppResult};
use pmaas_domain::{Role, RoleId, UserId};

/// PostgreSQL implementation of the role repository port.
///
/// Nothing is cached; each call reads committed rows.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
    id: uuid::Uuid,
    name: String,
    display_name: String,
    description: Option<String>,
    permissions: Vec<String>,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        Role::from_stored(
            RoleId::from_uuid(row.id),
            row.name,
            row.display_name,
            row.description,
            row.permissions,
        )
    }
}

mod assignments;


#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, display_name, description, permissions
            FROM roles
            WHERE name = $1
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role by name: {error}")))?;

        row.map(Role::try_from).transpose()
    }

    async fn find_role_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, display_name, description, permissions
            FROM roles
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role by id: {error}")))?;

        row.map(Role::try_from).transpose()
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, display_name, description, permissions
            FROM roles
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(Role::try_from).collect()
    }

    async fn assign_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
        assigned_by: Option<UserId>,
    ) -> AppResult<()> {
        self.assign_role_impl(user_id, role_id, assigned_by).await
    }

    async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        self.remove_role_impl(user_id, role_id).await
    }

    async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        self.list_user_roles_impl(user_id).await
    }

    async fn replace_user_roles(&self, user_id: UserId, role_ids: &[RoleId]) -> AppResult<()> {
        self.replace_user_roles_impl(user_id, role_ids).await
    }
}

fn assignment_error(error: sqlx::Error, user_id: UserId, role_id: RoleId) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error {
        match database_error.code().as_deref() {
            Some("23505") => {
                return AppError::Conflict(format!(
                    "role '{role_id}' is already assigned to user '{user_id}'"
                ));
            }
            Some("23503") => {
                return AppError::NotFound(format!(
                    "user '{user_id}' or role '{role_id}' does not exist"
                ));
            }
            _ => {}
        }
    }

    AppError::Internal(format!("failed to assign role: {error}"))
}
