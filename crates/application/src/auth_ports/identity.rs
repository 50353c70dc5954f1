use async_trait::async_trait;
use pmaas_core::{AppResult, IdentityClaims};

/// Verifies identity tokens issued by the external provider.
///
/// Implementations check signature, expiry, issuer and audience. Any failure
/// is reported as `AppError::Unauthorized`.
#[async_trait]
pub trait IdentityTokenVerifier: Send + Sync {
    /// Verifies a raw token and returns its claims.
    async fn verify(&self, token: &str) -> AppResult<IdentityClaims>;
}
