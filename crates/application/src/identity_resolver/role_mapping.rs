use std::fmt::{Display, Formatter};
use std::str::FromStr;

use pmaas_core::{AppError, AppResult};
use pmaas_domain::SystemRole;

/// Table translating identity provider realm roles into application roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMapping {
    entries: Vec<(String, SystemRole)>,
}

impl RoleMapping {
    /// Maps each system role from a realm role of the same name.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(
            SystemRole::all()
                .iter()
                .map(|role| (role.as_str().to_owned(), *role)),
        )
    }

    /// Creates a mapping from `(provider role, application role)` pairs.
    #[must_use]
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, SystemRole)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(provider_role, role)| (provider_role.into(), role))
                .collect(),
        }
    }

    /// Parses a comma-separated list of `provider=app` pairs.
    pub fn parse(value: &str) -> AppResult<Self> {
        let mut entries = Vec::new();

        for pair in value.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
            let Some((provider_role, app_role)) = pair.split_once('=') else {
                return Err(AppError::Validation(format!(
                    "role mapping entry '{pair}' must have the form 'provider=app'"
                )));
            };

            let provider_role = provider_role.trim();
            if provider_role.is_empty() {
                return Err(AppError::Validation(format!(
                    "role mapping entry '{pair}' has an empty provider role"
                )));
            }

            entries.push((provider_role.to_owned(), SystemRole::from_str(app_role.trim())?));
        }

        if entries.is_empty() {
            return Err(AppError::Validation(
                "role mapping must contain at least one entry".to_owned(),
            ));
        }

        Ok(Self { entries })
    }

    /// Returns the application roles implied by `realm_roles`, without duplicates.
    #[must_use]
    pub fn map(&self, realm_roles: &[String]) -> Vec<SystemRole> {
        let mut mapped = Vec::new();

        for (provider_role, role) in &self.entries {
            let asserted = realm_roles
                .iter()
                .any(|realm_role| realm_role == provider_role);
            if asserted && !mapped.contains(role) {
                mapped.push(*role);
            }
        }

        mapped
    }

    /// Returns the configured pairs.
    #[must_use]
    pub fn entries(&self) -> &[(String, SystemRole)] {
        self.entries.as_slice()
    }
}

impl Default for RoleMapping {
    fn default() -> Self {
        Self::identity()
    }
}

/// Failure policy for the role reconciliation performed at login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleSyncMode {
    /// Each removal and assignment runs on its own; failures are logged and skipped.
    #[default]
    BestEffort,
    /// The whole role set is replaced in one transaction; any failure rejects the login.
    Atomic,
}

impl RoleSyncMode {
    /// Returns the configuration value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BestEffort => "best_effort",
            Self::Atomic => "atomic",
        }
    }
}

impl Display for RoleSyncMode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RoleSyncMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "best_effort" => Ok(Self::BestEffort),
            "atomic" => Ok(Self::Atomic),
            other => Err(AppError::Validation(format!(
                "unknown role sync mode '{other}', expected 'best_effort' or 'atomic'"
            ))),
        }
    }
}
