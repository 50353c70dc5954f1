use std::sync::Arc;

use pmaas_application::{
    IdentityResolver, IdentityTokenVerifier, MfaService, RoleRepository, RoleService,
    SessionRepository, SessionService, TotpProvider, UserRepository, UserService,
};
use pmaas_core::AppError;
use pmaas_infrastructure::{
    JwksTokenVerifier, OidcVerifierConfig, PostgresRoleRepository, PostgresSessionRepository,
    PostgresUserRepository, TotpRsProvider,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::middleware::ReconciledTokens;
use crate::state::{AppState, AuthSettings};

/// Port implementations the application services are wired from.
pub struct StatePorts {
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub token_verifier: Arc<dyn IdentityTokenVerifier>,
    pub totp_provider: Arc<dyn TotpProvider>,
}

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let mut verifier_config =
        OidcVerifierConfig::new(config.oidc.issuer.as_str(), config.oidc.client_id.as_str())?
            .with_http_timeout(config.auth.verify_timeout);
    if let Some(jwks_uri) = config.oidc.jwks_uri.as_deref() {
        verifier_config = verifier_config.with_jwks_uri(jwks_uri)?;
    }

    let ports = StatePorts {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        roles: Arc::new(PostgresRoleRepository::new(pool.clone())),
        sessions: Arc::new(PostgresSessionRepository::new(pool)),
        token_verifier: Arc::new(JwksTokenVerifier::new(verifier_config)?),
        totp_provider: Arc::new(TotpRsProvider::new(config.mfa_issuer.as_str())),
    };

    Ok(assemble_app_state(ports, &config.auth))
}

pub fn assemble_app_state(ports: StatePorts, settings: &AuthSettings) -> AppState {
    let role_service = RoleService::new(ports.roles);
    let identity_resolver = IdentityResolver::new(ports.users.clone(), role_service.clone())
        .with_role_mapping(settings.role_mapping.clone())
        .with_sync_mode(settings.sync_mode);

    AppState {
        mfa_service: MfaService::new(ports.users.clone(), ports.totp_provider),
        user_service: UserService::new(ports.users, role_service.clone()),
        role_service,
        session_service: SessionService::new(ports.sessions),
        identity_resolver,
        token_verifier: ports.token_verifier,
        reconciled_tokens: Arc::new(ReconciledTokens::new(settings.reconcile_ttl)),
        verify_timeout: settings.verify_timeout,
        cookie_secure: settings.cookie_secure,
    }
}
