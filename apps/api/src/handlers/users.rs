use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use pmaas_application::{RegisterUserInput, UpdateProfileInput, UpdateUserInput, UserListQuery};
use pmaas_core::AppError;
use pmaas_domain::{UserId, UserStatus};
use uuid::Uuid;

use crate::dto::{
    ListUsersQuery, MessageResponse, PasswordResetRequest, ProfileResponse, RegisterUserRequest,
    UpdateProfileRequest, UpdateUserRequest, UserResponse,
};
use crate::error::ApiResult;
use crate::principal::RequestPrincipal;
use crate::state::AppState;

const MAX_PAGE_SIZE: u32 = 500;

pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .user_service
        .register(RegisterUserInput {
            username: payload.username,
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

pub async fn profile_handler(
    Extension(principal): Extension<RequestPrincipal>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = current_user(&principal)?;
    Ok(Json(ProfileResponse::from(user)))
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<RequestPrincipal>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let user_id = current_user(&principal)?.id();
    let user = state
        .user_service
        .update_profile(
            user_id,
            UpdateProfileInput {
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                phone_number: payload.phone_number,
                profile_picture_url: payload.profile_picture_url,
            },
        )
        .await?;

    Ok(Json(ProfileResponse::from(&user)))
}

/// Answers identically whether or not the address belongs to an account.
pub async fn password_reset_request_handler(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .user_service
        .request_password_reset(&payload.email)
        .await?;

    Ok(Json(MessageResponse::new(
        "If the email exists, a reset link has been sent",
    )))
}

pub async fn list_users_handler(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let defaults = UserListQuery::default();
    let query = UserListQuery {
        limit: query.limit.unwrap_or(defaults.limit).clamp(1, MAX_PAGE_SIZE),
        offset: query.offset.unwrap_or(defaults.offset),
    };

    let users = state.user_service.list_users(query).await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .user_service
        .get_user(UserId::from_uuid(user_id))
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let status = payload
        .status
        .as_deref()
        .map(UserStatus::from_str)
        .transpose()?;

    let user = state
        .user_service
        .update_user(
            UserId::from_uuid(user_id),
            UpdateUserInput {
                username: payload.username,
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                email_verified: payload.email_verified,
                status,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .user_service
        .delete_user(UserId::from_uuid(user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) fn current_user(principal: &RequestPrincipal) -> Result<&pmaas_domain::User, AppError> {
    principal
        .user()
        .ok_or_else(|| AppError::Unauthorized("no authenticated principal".to_owned()))
}
