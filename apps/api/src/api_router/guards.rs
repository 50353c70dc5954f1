use pmaas_application::AccessRequirement;
use pmaas_domain::SystemRole;

pub(super) fn authenticated() -> AccessRequirement {
    AccessRequirement::require_authenticated()
}

/// Admins and property managers.
pub(super) fn staff() -> AccessRequirement {
    AccessRequirement::require_any_role([
        SystemRole::Admin.as_str(),
        SystemRole::PropertyManager.as_str(),
    ])
}

pub(super) fn permission(permission: &str) -> AccessRequirement {
    AccessRequirement::require_permission(permission)
}
