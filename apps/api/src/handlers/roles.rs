use axum::Json;
use axum::extract::{Extension, Path, State};
use pmaas_core::AppError;
use pmaas_domain::{RoleId, UserId};
use tracing::info;
use uuid::Uuid;

use crate::dto::{AssignRoleRequest, MessageResponse, RoleResponse};
use crate::error::ApiResult;
use crate::principal::RequestPrincipal;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_service
        .list_roles()
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<RequestPrincipal>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = UserId::from_uuid(user_id);
    let role_id = RoleId::from_uuid(payload.role_id);
    let assigned_by = principal.user().map(|actor| actor.id());
    let role = state.role_service.get_role(role_id).await?;

    state
        .role_service
        .assign_role(user_id, role_id, assigned_by)
        .await
        .map_err(|error| {
            if error.is_conflict() {
                AppError::Conflict("Role already assigned to user".to_owned())
            } else {
                error
            }
        })?;

    info!(user_id = %user_id, role = role.name(), "role assigned");
    Ok(Json(MessageResponse::new("Role assigned successfully")))
}

pub async fn remove_role_handler(
    State(state): State<AppState>,
    Path((user_id, role_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = UserId::from_uuid(user_id);
    let role_id = RoleId::from_uuid(role_id);

    state.role_service.remove_role(user_id, role_id).await?;

    info!(user_id = %user_id, role_id = %role_id, "role removed");
    Ok(Json(MessageResponse::new("Role removed successfully")))
}
