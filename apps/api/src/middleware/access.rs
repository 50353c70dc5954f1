use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use pmaas_application::AccessRequirement;

use crate::error::ApiResult;
use crate::principal::RequestPrincipal;

/// Rejects the request unless its principal satisfies `requirement`.
///
/// Mounted with `from_fn_with_state(requirement, enforce_access)`; layers
/// stack, so every guard on a route must pass.
pub async fn enforce_access(
    State(requirement): State<AccessRequirement>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let principal = request
        .extensions()
        .get::<RequestPrincipal>()
        .and_then(RequestPrincipal::user);
    requirement.evaluate(principal)?;

    Ok(next.run(request).await)
}
