use pmaas_domain::User;

/// How the current principal proved its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// A verified provider identity token.
    IdentityToken,
    /// An unexpired server session.
    Session,
}

/// The caller attached to every request by the authentication middleware.
#[derive(Debug, Clone, Default)]
pub struct RequestPrincipal {
    authenticated: Option<(User, AuthSource)>,
}

impl RequestPrincipal {
    /// A caller without usable credentials.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A caller resolved to `user`.
    #[must_use]
    pub fn authenticated(user: User, source: AuthSource) -> Self {
        Self {
            authenticated: Some((user, source)),
        }
    }

    /// Returns the resolved user, with roles loaded.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.authenticated.as_ref().map(|(user, _)| user)
    }

    /// Returns how the user was authenticated.
    #[must_use]
    pub fn source(&self) -> Option<AuthSource> {
        self.authenticated.as_ref().map(|(_, source)| *source)
    }
}
