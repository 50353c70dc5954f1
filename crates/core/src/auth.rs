use serde::{Deserialize, Serialize};

/// Claims extracted from a verified identity token.
///
/// Field names follow the OIDC standard claims; realm roles are read from the
/// provider-specific `realm_access.roles` structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    #[serde(rename = "sub")]
    subject: String,
    #[serde(rename = "iat", default)]
    issued_at: Option<i64>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    realm_access: RealmAccess,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct RealmAccess {
    #[serde(default)]
    roles: Vec<String>,
}

impl IdentityClaims {
    /// Creates a claim set carrying only the stable subject identifier.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            issued_at: None,
            email: None,
            email_verified: false,
            preferred_username: None,
            given_name: None,
            family_name: None,
            realm_access: RealmAccess::default(),
        }
    }

    /// Sets the issued-at claim, in seconds since the Unix epoch.
    #[must_use]
    pub fn with_issued_at(mut self, issued_at: i64) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    /// Sets the email claim and its verification flag.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>, verified: bool) -> Self {
        self.email = Some(email.into());
        self.email_verified = verified;
        self
    }

    /// Sets the preferred username claim.
    #[must_use]
    pub fn with_preferred_username(mut self, username: impl Into<String>) -> Self {
        self.preferred_username = Some(username.into());
        self
    }

    /// Sets the given and family name claims.
    #[must_use]
    pub fn with_names(mut self, given_name: impl Into<String>, family_name: impl Into<String>) -> Self {
        self.given_name = Some(given_name.into());
        self.family_name = Some(family_name.into());
        self
    }

    /// Sets the realm roles asserted by the provider.
    #[must_use]
    pub fn with_realm_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.realm_access.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the issued-at claim, if present.
    #[must_use]
    pub fn issued_at(&self) -> Option<i64> {
        self.issued_at
    }

    /// Returns the email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns whether the provider vouches for the email address.
    #[must_use]
    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    /// Returns the provider's preferred username.
    #[must_use]
    pub fn preferred_username(&self) -> Option<&str> {
        self.preferred_username.as_deref()
    }

    /// Returns the given name.
    #[must_use]
    pub fn given_name(&self) -> Option<&str> {
        self.given_name.as_deref()
    }

    /// Returns the family name.
    #[must_use]
    pub fn family_name(&self) -> Option<&str> {
        self.family_name.as_deref()
    }

    /// Returns the realm roles asserted for this principal right now.
    #[must_use]
    pub fn realm_roles(&self) -> &[String] {
        self.realm_access.roles.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::IdentityClaims;

    #[test]
    fn claims_deserialize_nested_realm_roles() {
        let raw = serde_json::json!({
            "sub": "abc123",
            "iat": 1_767_225_600,
            "email": "pm@example.com",
            "email_verified": true,
            "preferred_username": "pm",
            "given_name": "Pat",
            "family_name": "Manager",
            "realm_access": { "roles": ["admin", "offline_access"] },
            "aud": "pmaas-app",
        });

        let claims = serde_json::from_value::<IdentityClaims>(raw);
        assert!(claims.is_ok());
        let claims = claims.unwrap_or_else(|_| IdentityClaims::new("invalid"));
        assert_eq!(claims.subject(), "abc123");
        assert_eq!(claims.issued_at(), Some(1_767_225_600));
        assert!(claims.email_verified());
        assert_eq!(claims.realm_roles(), ["admin", "offline_access"]);
    }

    #[test]
    fn missing_realm_access_yields_no_roles() {
        let raw = serde_json::json!({ "sub": "abc123" });
        let claims = serde_json::from_value::<IdentityClaims>(raw)
            .unwrap_or_else(|_| IdentityClaims::new("invalid"));

        assert_eq!(claims.subject(), "abc123");
        assert!(claims.realm_roles().is_empty());
        assert!(claims.email().is_none());
        assert!(claims.issued_at().is_none());
    }
}
