mod common;
mod mfa;
mod roles;
mod users;

pub use common::{HealthResponse, MessageResponse};
pub use mfa::{MfaCodeRequest, MfaEnrollmentResponse, MfaVerifyResponse};
pub use roles::{AssignRoleRequest, RoleResponse};
pub use users::{
    ListUsersQuery, PasswordResetRequest, ProfileResponse, RegisterUserRequest, SessionResponse,
    UpdateProfileRequest, UpdateUserRequest, UserResponse,
};
