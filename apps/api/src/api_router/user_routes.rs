use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};

use super::guards;
use crate::state::AppState;
use crate::{handlers, middleware};

pub(super) fn build_profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/users/profile",
            get(handlers::users::profile_handler).put(handlers::users::update_profile_handler),
        )
        .route(
            "/api/users/session",
            post(handlers::session::create_session_handler),
        )
        .route("/api/users/mfa/enable", post(handlers::mfa::enable_mfa_handler))
        .route("/api/users/mfa/disable", post(handlers::mfa::disable_mfa_handler))
        .route("/api/users/mfa/verify", post(handlers::mfa::verify_mfa_handler))
        .route_layer(from_fn_with_state(
            guards::authenticated(),
            middleware::enforce_access,
        ))
}

pub(super) fn build_user_admin_routes() -> Router<AppState> {
    let staff_only = get(handlers::users::get_user_handler)
        .put(handlers::users::update_user_handler)
        .route_layer(from_fn_with_state(
            guards::staff(),
            middleware::enforce_access,
        ));
    let delete_user = delete(handlers::users::delete_user_handler).route_layer(
        from_fn_with_state(guards::permission("users.delete"), middleware::enforce_access),
    );

    Router::new()
        .route(
            "/api/users",
            get(handlers::users::list_users_handler).route_layer(from_fn_with_state(
                guards::staff(),
                middleware::enforce_access,
            )),
        )
        .route("/api/users/{user_id}", staff_only.merge(delete_user))
}

pub(super) fn build_role_routes() -> Router<AppState> {
    let role_management = Router::new()
        .route(
            "/api/users/{user_id}/roles",
            post(handlers::roles::assign_role_handler),
        )
        .route(
            "/api/users/{user_id}/roles/{role_id}",
            delete(handlers::roles::remove_role_handler),
        )
        .route_layer(from_fn_with_state(
            guards::permission("roles.manage"),
            middleware::enforce_access,
        ));

    Router::new()
        .route(
            "/api/roles",
            get(handlers::roles::list_roles_handler).route_layer(from_fn_with_state(
                guards::staff(),
                middleware::enforce_access,
            )),
        )
        .merge(role_management)
}
