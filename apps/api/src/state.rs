use std::sync::Arc;
use std::time::Duration;

use pmaas_application::{
    IdentityResolver, IdentityTokenVerifier, MfaService, RoleMapping, RoleService, RoleSyncMode,
    SessionService, UserService,
};

use crate::middleware::ReconciledTokens;

/// Authentication behaviour shared by the middleware and handlers.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub role_mapping: RoleMapping,
    pub sync_mode: RoleSyncMode,
    pub verify_timeout: Duration,
    /// How long a reconciled identity token skips the login sync; zero disables.
    pub reconcile_ttl: Duration,
    pub cookie_secure: bool,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub role_service: RoleService,
    pub session_service: SessionService,
    pub mfa_service: MfaService,
    pub identity_resolver: IdentityResolver,
    pub token_verifier: Arc<dyn IdentityTokenVerifier>,
    pub reconciled_tokens: Arc<ReconciledTokens>,
    pub verify_timeout: Duration,
    pub cookie_secure: bool,
}
