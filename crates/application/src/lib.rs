//! Application services and ports.

#![forbid(unsafe_code)]

mod access_requirement;
mod auth_ports;
mod identity_resolver;
mod mfa_service;
mod role_service;
mod session_service;
mod token_crypto;
mod user_service;

#[cfg(test)]
mod test_support;

pub use access_requirement::AccessRequirement;
pub use auth_ports::{
    IdentityTokenVerifier, RoleRepository, SessionRepository, TotpEnrollment, TotpProvider,
    UserListQuery, UserRepository,
};
pub use identity_resolver::{IdentityResolver, RoleMapping, RoleSyncMode};
pub use mfa_service::MfaService;
pub use role_service::RoleService;
pub use session_service::{DEFAULT_SESSION_TTL_SECONDS, IssuedSession, SessionService};
pub use user_service::{
    IssuedPasswordReset, PASSWORD_RESET_TTL_HOURS, RegisterUserInput, UpdateProfileInput,
    UpdateUserInput, UserService,
};
