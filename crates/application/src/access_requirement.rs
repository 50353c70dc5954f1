use pmaas_core::{AppError, AppResult};
use pmaas_domain::User;

/// Authorization guard evaluated against the request principal.
///
/// Guards are pure: they read only the roles already loaded on the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRequirement {
    /// Any authenticated principal.
    Authenticated,
    /// The principal must hold a permission, directly or through a wildcard.
    Permission(String),
    /// The principal must hold the named role.
    Role(String),
    /// The principal must hold at least one of the named roles.
    AnyRole(Vec<String>),
}

impl AccessRequirement {
    /// Requires any authenticated principal.
    #[must_use]
    pub fn require_authenticated() -> Self {
        Self::Authenticated
    }

    /// Requires `permission`.
    #[must_use]
    pub fn require_permission(permission: impl Into<String>) -> Self {
        Self::Permission(permission.into())
    }

    /// Requires the role named `role`.
    #[must_use]
    pub fn require_role(role: impl Into<String>) -> Self {
        Self::Role(role.into())
    }

    /// Requires at least one of `roles`.
    #[must_use]
    pub fn require_any_role<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyRole(roles.into_iter().map(Into::into).collect())
    }

    /// Decides whether `principal` satisfies this requirement.
    ///
    /// Returns `AppError::Unauthorized` when there is no principal and
    /// `AppError::Forbidden` when the principal lacks the grant.
    pub fn evaluate(&self, principal: Option<&User>) -> AppResult<()> {
        let Some(user) = principal else {
            return Err(AppError::Unauthorized(
                "no authenticated principal".to_owned(),
            ));
        };

        let allowed = match self {
            Self::Authenticated => true,
            Self::Permission(permission) => user.has_permission(permission),
            Self::Role(role) => user.has_role(role),
            Self::AnyRole(roles) => user.has_any_role(roles.as_slice()),
        };

        if allowed {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "user '{}' does not satisfy {self:?}",
                user.id()
            )))
        }
    }
}
