//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod role;
mod security;
mod session;
mod user;

pub use role::{Role, RoleId, SystemRole};
pub use security::{Permission, PermissionSet};
pub use session::UserSession;
pub use user::{EmailAddress, PasswordResetTicket, User, UserId, UserProfile, UserStatus};
