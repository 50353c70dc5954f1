use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use pmaas_domain::User;
use tracing::{debug, warn};

use crate::cookies::{ID_TOKEN_COOKIE, SESSION_TOKEN_COOKIE, read_cookie};
use crate::principal::{AuthSource, RequestPrincipal};
use crate::state::AppState;

/// Attaches a [`RequestPrincipal`] to every request.
///
/// Never rejects: unusable credentials leave the request anonymous and the
/// guards decide what that means for the route.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = resolve_principal(&state, request.headers()).await;
    request.extensions_mut().insert(principal);
    next.run(request).await
}

async fn resolve_principal(state: &AppState, headers: &HeaderMap) -> RequestPrincipal {
    if let Some(token) = read_cookie(headers, ID_TOKEN_COOKIE)
        && let Some(user) = federated_user(state, &token).await
    {
        if user.status().is_active() {
            return RequestPrincipal::authenticated(user, AuthSource::IdentityToken);
        }
        debug!(
            user_id = %user.id(),
            status = user.status().as_str(),
            "ignoring inactive federated user"
        );
    }

    if let Some(token) = read_cookie(headers, SESSION_TOKEN_COOKIE)
        && let Some(user) = session_user(state, &token).await
    {
        if user.status().is_active() {
            return RequestPrincipal::authenticated(user, AuthSource::Session);
        }
        debug!(
            user_id = %user.id(),
            status = user.status().as_str(),
            "ignoring inactive session user"
        );
    }

    RequestPrincipal::anonymous()
}

async fn federated_user(state: &AppState, token: &str) -> Option<User> {
    let verification =
        tokio::time::timeout(state.verify_timeout, state.token_verifier.verify(token));
    let claims = match verification.await {
        Ok(Ok(claims)) => claims,
        Ok(Err(error)) => {
            debug!(error = %error, "identity token rejected");
            return None;
        }
        Err(_) => {
            warn!(
                timeout_ms = state.verify_timeout.as_millis() as u64,
                "identity token verification timed out"
            );
            return None;
        }
    };

    if let Some(user_id) = state.reconciled_tokens.lookup(&claims).await {
        match state.user_service.find_user(user_id).await {
            Ok(Some(user)) => return Some(user),
            Ok(None) => state.reconciled_tokens.forget(&claims).await,
            Err(error) => {
                warn!(user_id = %user_id, error = %error, "failed to load reconciled user");
                return None;
            }
        }
    }

    match state.identity_resolver.resolve(&claims).await {
        Ok(user) => {
            state.reconciled_tokens.remember(&claims, user.id()).await;
            Some(user)
        }
        Err(error) => {
            warn!(subject = claims.subject(), error = %error, "failed to resolve federated user");
            None
        }
    }
}

async fn session_user(state: &AppState, token: &str) -> Option<User> {
    let session = match state.session_service.find_active_session(token).await {
        Ok(Some(session)) => session,
        Ok(None) => return None,
        Err(error) => {
            warn!(error = %error, "failed to look up session");
            return None;
        }
    };

    match state.user_service.find_user(session.user_id()).await {
        Ok(user) => user,
        Err(error) => {
            warn!(user_id = %session.user_id(), error = %error, "failed to load session user");
            None
        }
    }
}
