use axum::Json;
use axum::extract::{Extension, State};
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::AppendHeaders;
use pmaas_core::AppError;
use tracing::{info, warn};

use crate::cookies::{ID_TOKEN_COOKIE, SESSION_TOKEN_COOKIE, read_cookie, removal_cookie, session_cookie};
use crate::dto::{MessageResponse, SessionResponse};
use crate::error::ApiResult;
use crate::middleware::ClientContext;
use crate::principal::RequestPrincipal;
use crate::state::AppState;

type SetCookies<const N: usize> = AppendHeaders<[(axum::http::HeaderName, String); N]>;

/// Mints a server session for the current principal.
pub async fn create_session_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<RequestPrincipal>,
    client: ClientContext,
) -> ApiResult<(SetCookies<1>, Json<SessionResponse>)> {
    let user = principal
        .user()
        .ok_or_else(|| AppError::Unauthorized("session requires a principal".to_owned()))?;

    let issued = state
        .session_service
        .create_session(user.id(), client.ip_address, client.user_agent)
        .await?;

    info!(user_id = %user.id(), source = ?principal.source(), "server session created");
    let cookie = session_cookie(
        &issued.token,
        state.session_service.ttl().num_seconds(),
        state.cookie_secure,
    );

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(SessionResponse {
            expires_at: issued.session.expires_at(),
        }),
    ))
}

/// Deletes the server session, if any, and expires both auth cookies.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (SetCookies<2>, Json<MessageResponse>) {
    if let Some(token) = read_cookie(&headers, SESSION_TOKEN_COOKIE)
        && let Err(error) = state.session_service.revoke_session(&token).await
    {
        warn!(error = %error, "failed to delete session on logout");
    }

    (
        AppendHeaders([
            (SET_COOKIE, removal_cookie(SESSION_TOKEN_COOKIE, state.cookie_secure)),
            (SET_COOKIE, removal_cookie(ID_TOKEN_COOKIE, state.cookie_secure)),
        ]),
        Json(MessageResponse::new("Logged out successfully")),
    )
}
