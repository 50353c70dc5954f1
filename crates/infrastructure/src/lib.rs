//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_auth_store;
mod jwks_token_verifier;
mod postgres_role_repository;
mod postgres_session_repository;
mod postgres_user_repository;
mod totp_provider;

pub use in_memory_auth_store::InMemoryAuthStore;
pub use jwks_token_verifier::{JwksTokenVerifier, OidcVerifierConfig};
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_session_repository::PostgresSessionRepository;
pub use postgres_user_repository::PostgresUserRepository;
pub use totp_provider::TotpRsProvider;
