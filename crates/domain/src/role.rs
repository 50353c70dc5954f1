use std::fmt::{Display, Formatter};
use std::str::FromStr;

use pmaas_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::security::Permission;

/// Unique identifier for a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// The fixed, seeded application roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    /// Full administrative access.
    Admin,
    /// Manages properties, tenants and leases.
    PropertyManager,
    /// Resident with access to their own lease and requests.
    Tenant,
    /// Read-only staff access.
    Viewer,
}

impl SystemRole {
    /// Role assigned when nothing else applies.
    pub const DEFAULT: Self = Self::Tenant;

    /// Returns the stable role name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::PropertyManager => "property_manager",
            Self::Tenant => "tenant",
            Self::Viewer => "viewer",
        }
    }

    /// Returns the human-readable name used by the seed data.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::PropertyManager => "Property Manager",
            Self::Tenant => "Tenant",
            Self::Viewer => "Viewer",
        }
    }

    /// Returns the permissions seeded for this role.
    #[must_use]
    pub fn seed_permissions(&self) -> &'static [&'static str] {
        match self {
            Self::Admin => &[
                "users.*",
                "properties.*",
                "tenants.*",
                "leases.*",
                "payments.*",
                "maintenance.*",
                "reports.*",
                "analytics.*",
                "roles.manage",
                "system.settings",
            ],
            Self::PropertyManager => &[
                "properties.*",
                "tenants.*",
                "leases.*",
                "payments.read",
                "payments.update",
                "maintenance.*",
                "reports.*",
                "analytics.read",
            ],
            Self::Tenant => &[
                "profile.read",
                "profile.update",
                "lease.read.own",
                "payments.read.own",
                "maintenance.create.own",
                "maintenance.read.own",
            ],
            Self::Viewer => &["properties.read", "tenants.read", "maintenance.read"],
        }
    }

    /// Returns all system roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[SystemRole] = &[
            SystemRole::Admin,
            SystemRole::PropertyManager,
            SystemRole::Tenant,
            SystemRole::Viewer,
        ];

        ALL
    }
}

impl Display for SystemRole {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SystemRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "property_manager" => Ok(Self::PropertyManager),
            "tenant" => Ok(Self::Tenant),
            "viewer" => Ok(Self::Viewer),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

/// Named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: NonEmptyString,
    display_name: NonEmptyString,
    description: Option<String>,
    permissions: Vec<Permission>,
}

impl Role {
    /// Creates a validated role.
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: Option<String>,
        permissions: Vec<Permission>,
    ) -> AppResult<Self> {
        let description = description.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            display_name: NonEmptyString::new(display_name)?,
            description,
            permissions,
        })
    }

    /// Creates a role from stored permission strings, validating each one.
    pub fn from_stored(
        id: RoleId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: Option<String>,
        permissions: Vec<String>,
    ) -> AppResult<Self> {
        let permissions = permissions
            .into_iter()
            .map(Permission::parse)
            .collect::<AppResult<Vec<_>>>()?;

        Self::new(id, name, display_name, description, permissions)
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the unique role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the ordered permission list.
    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        self.permissions.as_slice()
    }

    /// Returns the matching system role, if this is one of the seeded roles.
    #[must_use]
    pub fn system_role(&self) -> Option<SystemRole> {
        SystemRole::from_str(self.name()).ok()
    }
}
