use std::fmt::{Display, Formatter};
use std::str::FromStr;

use pmaas_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const WILDCARD_SUFFIX: &str = ".*";

/// Capability string held by a role.
///
/// Either an exact `resource.action` form (optionally with further qualifier
/// segments such as `payments.read.own`) or a wildcard `resource.*` that
/// grants every permission starting with `resource.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(String);

impl Permission {
    /// Parses and validates a permission string.
    pub fn parse(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "permission must not be empty".to_owned(),
            ));
        }

        let segments: Vec<&str> = trimmed.split('.').collect();
        if segments.len() < 2 {
            return Err(AppError::Validation(format!(
                "permission '{trimmed}' must have the form 'resource.action'"
            )));
        }

        let last_index = segments.len() - 1;
        for (index, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(AppError::Validation(format!(
                    "permission '{trimmed}' contains an empty segment"
                )));
            }

            if segment.contains('*') && (index != last_index || *segment != "*") {
                return Err(AppError::Validation(format!(
                    "permission '{trimmed}' may only use '*' as its final segment"
                )));
            }
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the permission string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns true when this is a `resource.*` grant.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0.ends_with(WILDCARD_SUFFIX)
    }

    /// Returns whether holding this permission satisfies `required`.
    ///
    /// Exact equality always matches. A wildcard `resource.*` matches any
    /// required string that starts with the literal `resource.`; this is a
    /// flat prefix test, not a hierarchy walk.
    #[must_use]
    pub fn matches(&self, required: &str) -> bool {
        if self.0 == required {
            return true;
        }

        match self.0.strip_suffix('*') {
            Some(prefix) if self.is_wildcard() => required.starts_with(prefix),
            _ => false,
        }
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Permission {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.0
    }
}

/// Union of the permissions granted across a principal's roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(Vec<Permission>);

impl PermissionSet {
    /// Creates an empty permission set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a permission unless an identical one is already present.
    pub fn insert(&mut self, permission: Permission) {
        if !self.0.contains(&permission) {
            self.0.push(permission);
        }
    }

    /// Returns whether any held permission satisfies `required`.
    #[must_use]
    pub fn grants(&self, required: &str) -> bool {
        self.0.iter().any(|permission| permission.matches(required))
    }

    /// Returns the held permissions in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Permission] {
        self.0.as_slice()
    }

    /// Returns the number of distinct permissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no permission is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        let mut set = Self::new();
        for permission in iter {
            set.insert(permission);
        }
        set
    }
}
