mod identity;
mod mfa;
mod roles;
mod sessions;
mod users;

pub use identity::IdentityTokenVerifier;
pub use mfa::{TotpEnrollment, TotpProvider};
pub use roles::RoleRepository;
pub use sessions::SessionRepository;
pub use users::{UserListQuery, UserRepository};
