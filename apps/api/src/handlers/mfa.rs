use axum::Json;
use axum::extract::{Extension, State};

use super::users::current_user;
use crate::dto::{MessageResponse, MfaCodeRequest, MfaEnrollmentResponse, MfaVerifyResponse};
use crate::error::ApiResult;
use crate::principal::RequestPrincipal;
use crate::state::AppState;

pub async fn enable_mfa_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<RequestPrincipal>,
) -> ApiResult<Json<MfaEnrollmentResponse>> {
    let user_id = current_user(&principal)?.id();
    let enrollment = state.mfa_service.enable(user_id).await?;
    Ok(Json(MfaEnrollmentResponse::from(enrollment)))
}

pub async fn disable_mfa_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<RequestPrincipal>,
    Json(payload): Json<MfaCodeRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = current_user(&principal)?.id();
    state.mfa_service.disable(user_id, &payload.mfa_code).await?;
    Ok(Json(MessageResponse::new("MFA disabled successfully")))
}

pub async fn verify_mfa_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<RequestPrincipal>,
    Json(payload): Json<MfaCodeRequest>,
) -> ApiResult<Json<MfaVerifyResponse>> {
    let user_id = current_user(&principal)?.id();
    let valid = state.mfa_service.verify(user_id, &payload.mfa_code).await?;
    Ok(Json(MfaVerifyResponse { valid }))
}
