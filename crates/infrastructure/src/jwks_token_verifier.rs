//! OIDC identity token verification against the provider's published JWKS.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use url::Url;

use pmaas_application::IdentityTokenVerifier;
use pmaas_core::{AppError, AppResult, IdentityClaims};

const SUPPORTED_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::ES256,
    Algorithm::ES384,
];

/// Minimum spacing between key fetches triggered by unknown `kid`s.
const FORCED_REFRESH_COOLDOWN: Duration = Duration::from_secs(60);

/// Settings for [`JwksTokenVerifier`].
#[derive(Debug, Clone)]
pub struct OidcVerifierConfig {
    issuer: String,
    client_id: String,
    jwks_uri: Option<String>,
    http_timeout: Duration,
    jwks_cache_ttl: Duration,
    leeway_secs: u64,
}

impl OidcVerifierConfig {
    /// Creates settings for an issuer URL and the expected audience.
    pub fn new(issuer: impl Into<String>, client_id: impl Into<String>) -> AppResult<Self> {
        let issuer = issuer.into();
        Url::parse(issuer.as_str())
            .map_err(|error| AppError::Validation(format!("invalid OIDC issuer URL: {error}")))?;

        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(AppError::Validation(
                "OIDC client id must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            issuer: issuer.trim_end_matches('/').to_owned(),
            client_id,
            jwks_uri: None,
            http_timeout: Duration::from_secs(5),
            jwks_cache_ttl: Duration::from_secs(3600),
            leeway_secs: 30,
        })
    }

    /// Uses a fixed JWKS endpoint instead of discovery.
    pub fn with_jwks_uri(mut self, jwks_uri: impl Into<String>) -> AppResult<Self> {
        let jwks_uri = jwks_uri.into();
        Url::parse(jwks_uri.as_str())
            .map_err(|error| AppError::Validation(format!("invalid OIDC JWKS URL: {error}")))?;
        self.jwks_uri = Some(jwks_uri);
        Ok(self)
    }

    /// Sets the HTTP timeout used for discovery and key fetches.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Sets the clock skew tolerated on `exp` and `nbf`.
    #[must_use]
    pub fn with_leeway_secs(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Returns the normalized issuer.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the expected audience.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: String,
}

#[derive(Debug)]
struct CachedKeys {
    fetched_at: Instant,
    keys: Arc<JwkSet>,
}

#[derive(Debug, Default)]
struct KeyState {
    jwks_uri: Option<String>,
    cached: Option<CachedKeys>,
    last_refresh: Option<Instant>,
}

impl KeyState {
    /// Returns the cached keys when no fetch is due. A fetch attempted within
    /// the cooldown, successful or not, suppresses another one.
    fn reusable(&self, force: bool, ttl: Duration) -> Option<Arc<JwkSet>> {
        let cached = self.cached.as_ref()?;
        let within_ttl = cached.fetched_at.elapsed() < ttl;
        let cooling_down = self
            .last_refresh
            .is_some_and(|attempted_at| attempted_at.elapsed() < FORCED_REFRESH_COOLDOWN);

        ((within_ttl && !force) || cooling_down).then(|| cached.keys.clone())
    }
}

/// Verifies identity tokens issued by an OpenID Connect provider.
///
/// Signing keys are discovered from `{issuer}/.well-known/openid-configuration`
/// unless a JWKS URI is configured. A token naming an unknown `kid` triggers
/// one refresh, at most once per cooldown period. Fetches are serialized and
/// never hold the key lock across network calls.
#[derive(Clone)]
pub struct JwksTokenVerifier {
    config: Arc<OidcVerifierConfig>,
    http: Client,
    state: Arc<RwLock<KeyState>>,
    refresh_gate: Arc<Mutex<()>>,
    refreshable: bool,
}

impl JwksTokenVerifier {
    /// Creates a verifier that fetches keys lazily on first use.
    pub fn new(config: OidcVerifierConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build OIDC http client: {error}"))
            })?;

        let state = KeyState {
            jwks_uri: config.jwks_uri.clone(),
            ..KeyState::default()
        };

        Ok(Self {
            config: Arc::new(config),
            http,
            state: Arc::new(RwLock::new(state)),
            refresh_gate: Arc::new(Mutex::new(())),
            refreshable: true,
        })
    }

    /// Creates a verifier pinned to a fixed key set that is never refreshed.
    pub fn with_key_set(config: OidcVerifierConfig, keys: JwkSet) -> AppResult<Self> {
        let mut verifier = Self::new(config)?;
        verifier.state = Arc::new(RwLock::new(KeyState {
            cached: Some(CachedKeys {
                fetched_at: Instant::now(),
                keys: Arc::new(keys),
            }),
            ..KeyState::default()
        }));
        verifier.refreshable = false;
        Ok(verifier)
    }

    async fn signing_key(&self, kid: Option<&str>) -> AppResult<Jwk> {
        let (keys, fresh) = self.current_keys(false).await?;
        match select_jwk(&keys, kid) {
            Ok(jwk) => Ok(jwk.clone()),
            Err(error) if self.refreshable && !fresh && kid.is_some() => {
                debug!(kid = kid.unwrap_or_default(), "unknown signing key, refreshing JWKS");
                let (keys, _) = self.current_keys(true).await?;
                select_jwk(&keys, kid).cloned().map_err(|_| error)
            }
            Err(error) => Err(error),
        }
    }

    /// Returns the cached keys, fetching when missing, stale or forced.
    /// The flag reports whether the keys were fetched by this call.
    async fn current_keys(&self, force: bool) -> AppResult<(Arc<JwkSet>, bool)> {
        if let Some(keys) = self.reusable_keys(force).await {
            return Ok((keys, false));
        }

        let _refresh = self.refresh_gate.lock().await;
        // A concurrent caller may have refreshed while this one waited.
        if let Some(keys) = self.reusable_keys(force).await {
            return Ok((keys, false));
        }

        let known_uri = self.state.read().await.jwks_uri.clone();
        self.state.write().await.last_refresh = Some(Instant::now());
        let jwks_uri = match known_uri {
            Some(uri) => uri,
            None => {
                let uri = self.discover_jwks_uri().await?;
                self.state.write().await.jwks_uri = Some(uri.clone());
                uri
            }
        };

        match self.fetch_keys(jwks_uri.as_str()).await {
            Ok(keys) => {
                let keys = Arc::new(keys);
                self.state.write().await.cached = Some(CachedKeys {
                    fetched_at: Instant::now(),
                    keys: keys.clone(),
                });
                Ok((keys, true))
            }
            Err(error) => match self.state.read().await.cached.as_ref() {
                Some(cached) => {
                    warn!(jwks_uri = %jwks_uri, error = %error, "JWKS refresh failed, using cached keys");
                    Ok((cached.keys.clone(), false))
                }
                None => Err(error),
            },
        }
    }

    async fn reusable_keys(&self, force: bool) -> Option<Arc<JwkSet>> {
        let state = self.state.read().await;
        if !self.refreshable {
            return state.cached.as_ref().map(|cached| cached.keys.clone());
        }
        state.reusable(force, self.config.jwks_cache_ttl)
    }

    async fn discover_jwks_uri(&self) -> AppResult<String> {
        let url = format!("{}/.well-known/openid-configuration", self.config.issuer);
        let response = self.http.get(&url).send().await.map_err(|error| {
            AppError::Unauthorized(format!("OIDC discovery request failed: {error}"))
        })?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(format!(
                "OIDC discovery at '{url}' returned {}",
                response.status()
            )));
        }

        let document = response.json::<DiscoveryDocument>().await.map_err(|error| {
            AppError::Unauthorized(format!("invalid OIDC discovery document: {error}"))
        })?;

        if document.jwks_uri.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "OIDC discovery document has an empty jwks_uri".to_owned(),
            ));
        }

        Ok(document.jwks_uri)
    }

    async fn fetch_keys(&self, jwks_uri: &str) -> AppResult<JwkSet> {
        let response = self.http.get(jwks_uri).send().await.map_err(|error| {
            AppError::Unauthorized(format!("JWKS request failed: {error}"))
        })?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(format!(
                "JWKS at '{jwks_uri}' returned {}",
                response.status()
            )));
        }

        let keys = response
            .json::<JwkSet>()
            .await
            .map_err(|error| AppError::Unauthorized(format!("invalid JWKS document: {error}")))?;

        debug!(jwks_uri, key_count = keys.keys.len(), "fetched JWKS");
        Ok(keys)
    }
}

#[async_trait]
impl IdentityTokenVerifier for JwksTokenVerifier {
    async fn verify(&self, token: &str) -> AppResult<IdentityClaims> {
        let header = decode_header(token)
            .map_err(|error| AppError::Unauthorized(format!("invalid token header: {error}")))?;

        if !SUPPORTED_ALGORITHMS.contains(&header.alg) {
            return Err(AppError::Unauthorized(format!(
                "unsupported token algorithm {:?}",
                header.alg
            )));
        }

        let jwk = self.signing_key(header.kid.as_deref()).await?;
        let key = DecodingKey::from_jwk(&jwk)
            .map_err(|error| AppError::Unauthorized(format!("unusable signing key: {error}")))?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_audience(&[self.config.client_id.as_str()]);
        validation.leeway = self.config.leeway_secs;

        let token_data = decode::<IdentityClaims>(token, &key, &validation)
            .map_err(|error| AppError::Unauthorized(format!("token rejected: {error}")))?;

        Ok(token_data.claims)
    }
}

fn select_jwk<'a>(keys: &'a JwkSet, kid: Option<&str>) -> AppResult<&'a Jwk> {
    if keys.keys.is_empty() {
        return Err(AppError::Unauthorized("JWKS contains no keys".to_owned()));
    }

    match kid {
        Some(kid) => keys
            .keys
            .iter()
            .find(|jwk| jwk.common.key_id.as_deref() == Some(kid))
            .ok_or_else(|| AppError::Unauthorized(format!("no signing key for kid '{kid}'"))),
        None if keys.keys.len() == 1 => keys
            .keys
            .first()
            .ok_or_else(|| AppError::Unauthorized("JWKS contains no keys".to_owned())),
        None => Err(AppError::Unauthorized(
            "token kid is required when several signing keys are published".to_owned(),
        )),
    }
}

#[cfg(test)]
mod tests;
