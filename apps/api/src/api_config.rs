use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use pmaas_application::{RoleMapping, RoleSyncMode};
use pmaas_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::state::AuthSettings;

#[derive(Debug, Clone)]
pub struct OidcConfig {
    pub issuer: String,
    pub client_id: String,
    pub jwks_uri: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub oidc: OidcConfig,
    pub mfa_issuer: String,
    pub auth: AuthSettings,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let database_url = required_non_empty(&lookup, "DATABASE_URL")?;

        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:8000".to_owned());
        Url::parse(&frontend_url)
            .map_err(|error| AppError::Validation(format!("invalid FRONTEND_URL: {error}")))?;

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = match lookup("API_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid API_PORT: {error}")))?,
            None => 8000,
        };

        let issuer = required_non_empty(&lookup, "OIDC_ISSUER")?;
        Url::parse(&issuer)
            .map_err(|error| AppError::Validation(format!("invalid OIDC_ISSUER: {error}")))?;
        let client_id = lookup("OIDC_CLIENT_ID")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "pmaas-app".to_owned());
        let jwks_uri = lookup("OIDC_JWKS_URI").filter(|value| !value.trim().is_empty());

        let verify_timeout_ms = match lookup("OIDC_VERIFY_TIMEOUT_MS") {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!("invalid OIDC_VERIFY_TIMEOUT_MS: {error}"))
            })?,
            None => 5000,
        };
        if verify_timeout_ms == 0 {
            return Err(AppError::Validation(
                "OIDC_VERIFY_TIMEOUT_MS must be greater than zero".to_owned(),
            ));
        }

        let role_mapping = match lookup("OIDC_ROLE_MAPPING").filter(|value| !value.trim().is_empty())
        {
            Some(value) => RoleMapping::parse(&value)?,
            None => RoleMapping::identity(),
        };
        let sync_mode = match lookup("ROLE_SYNC_MODE") {
            Some(value) => RoleSyncMode::from_str(&value)?,
            None => RoleSyncMode::default(),
        };

        let reconcile_ttl_secs = match lookup("AUTH_RECONCILE_TTL_SECS") {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!("invalid AUTH_RECONCILE_TTL_SECS: {error}"))
            })?,
            None => 300,
        };

        let mfa_issuer = lookup("MFA_ISSUER")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "PMaaS".to_owned());
        if mfa_issuer.contains(':') {
            return Err(AppError::Validation(
                "MFA_ISSUER must not contain ':'".to_owned(),
            ));
        }

        let cookie_secure = lookup("COOKIE_SECURE")
            .unwrap_or_else(|| "false".to_owned())
            .eq_ignore_ascii_case("true");

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            api_host,
            api_port,
            oidc: OidcConfig {
                issuer,
                client_id,
                jwks_uri,
            },
            mfa_issuer,
            auth: AuthSettings {
                role_mapping,
                sync_mode,
                verify_timeout: Duration::from_millis(verify_timeout_ms),
                reconcile_ttl: Duration::from_secs(reconcile_ttl_secs),
                cookie_secure,
            },
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
