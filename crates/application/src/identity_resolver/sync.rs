use std::collections::HashMap;

use pmaas_core::{AppError, AppResult};
use pmaas_domain::{Role, RoleId, SystemRole, UserId};
use tracing::{debug, warn};

use super::IdentityResolver;

impl IdentityResolver {
    /// Removes every system role, then assigns `targets` (or the default role
    /// when nothing could be assigned). Individual failures are logged and
    /// skipped.
    pub(super) async fn sync_best_effort(&self, user_id: UserId, targets: &[SystemRole]) {
        let roles = match self.system_roles().await {
            Ok(roles) => roles,
            Err(error) => {
                warn!(user_id = %user_id, error = %error, "skipping role sync, roles unavailable");
                return;
            }
        };

        for system_role in SystemRole::all() {
            let Some(role_id) = roles.get(system_role) else {
                continue;
            };

            if let Err(error) = self.role_service.remove_role(user_id, *role_id).await {
                warn!(
                    user_id = %user_id,
                    role = %system_role,
                    error = %error,
                    "failed to remove role during sync"
                );
            }
        }

        let mut assigned = 0_usize;
        for system_role in targets {
            if self.assign_lenient(user_id, *system_role, &roles).await {
                assigned += 1;
            }
        }

        if assigned == 0 {
            debug!(user_id = %user_id, "no mapped roles assigned, applying default role");
            self.assign_lenient(user_id, SystemRole::DEFAULT, &roles)
                .await;
        }
    }

    /// Writes the reconciled role set in a single transaction.
    pub(super) async fn sync_atomic(&self, user_id: UserId, targets: &[SystemRole]) -> AppResult<()> {
        let roles = self
            .system_roles()
            .await
            .map_err(|error| AppError::Internal(format!("failed to load roles for sync: {error}")))?;

        let effective: &[SystemRole] = if targets.is_empty() {
            &[SystemRole::DEFAULT]
        } else {
            targets
        };

        let role_ids = effective
            .iter()
            .map(|system_role| {
                roles.get(system_role).copied().ok_or_else(|| {
                    AppError::Internal(format!("role '{system_role}' is not seeded"))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        self.role_service
            .replace_user_roles(user_id, &role_ids)
            .await
            .map_err(|error| AppError::Internal(format!("failed to synchronize roles: {error}")))
    }

    async fn assign_lenient(
        &self,
        user_id: UserId,
        system_role: SystemRole,
        roles: &HashMap<SystemRole, RoleId>,
    ) -> bool {
        let Some(role_id) = roles.get(&system_role) else {
            warn!(user_id = %user_id, role = %system_role, "role is not seeded, skipping");
            return false;
        };

        match self.role_service.assign_role(user_id, *role_id, None).await {
            Ok(()) => true,
            Err(error) if error.is_conflict() => true,
            Err(error) => {
                warn!(
                    user_id = %user_id,
                    role = %system_role,
                    error = %error,
                    "failed to assign role during sync"
                );
                false
            }
        }
    }

    async fn system_roles(&self) -> AppResult<HashMap<SystemRole, RoleId>> {
        let roles = self.role_service.list_roles().await?;
        Ok(roles
            .iter()
            .filter_map(|role: &Role| role.system_role().map(|system_role| (system_role, role.id())))
            .collect())
    }
}
