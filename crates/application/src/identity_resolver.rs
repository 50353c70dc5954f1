//! Sync-on-login: maps verified provider claims onto a local user and
//! reconciles its role assignments with the provider's realm roles.

use std::sync::Arc;

use pmaas_core::{AppResult, IdentityClaims};
use pmaas_domain::User;
use tracing::debug;

use crate::{RoleService, UserRepository};

mod provisioning;
mod role_mapping;
mod sync;


pub use role_mapping::{RoleMapping, RoleSyncMode};

/// Resolves verified identity claims to a local user with synchronized roles.
#[derive(Clone)]
pub struct IdentityResolver {
    user_repository: Arc<dyn UserRepository>,
    role_service: RoleService,
    role_mapping: RoleMapping,
    sync_mode: RoleSyncMode,
}

impl IdentityResolver {
    /// Creates a resolver with the identity role mapping and best-effort sync.
    #[must_use]
    pub fn new(user_repository: Arc<dyn UserRepository>, role_service: RoleService) -> Self {
        Self {
            user_repository,
            role_service,
            role_mapping: RoleMapping::identity(),
            sync_mode: RoleSyncMode::default(),
        }
    }

    /// Replaces the provider-to-application role mapping.
    #[must_use]
    pub fn with_role_mapping(mut self, role_mapping: RoleMapping) -> Self {
        self.role_mapping = role_mapping;
        self
    }

    /// Replaces the role sync failure policy.
    #[must_use]
    pub fn with_sync_mode(mut self, sync_mode: RoleSyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    /// Finds or creates the user for `claims`, synchronizes its roles and
    /// returns it with roles loaded.
    pub async fn resolve(&self, claims: &IdentityClaims) -> AppResult<User> {
        let user = self.find_or_create(claims).await?;
        let targets = self.role_mapping.map(claims.realm_roles());

        debug!(
            user_id = %user.id(),
            realm_roles = ?claims.realm_roles(),
            mapped_roles = ?targets,
            sync_mode = %self.sync_mode,
            "synchronizing roles from identity claims"
        );

        match self.sync_mode {
            RoleSyncMode::BestEffort => self.sync_best_effort(user.id(), &targets).await,
            RoleSyncMode::Atomic => self.sync_atomic(user.id(), &targets).await?,
        }

        let roles = self.role_service.list_user_roles(user.id()).await?;
        Ok(user.with_roles(roles))
    }
}
