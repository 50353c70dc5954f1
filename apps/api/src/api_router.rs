use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use pmaas_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;
mod guards;
mod user_routes;


pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let cors_layer = cors::build_cors_layer(frontend_url)?;

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/users/register",
            post(handlers::users::register_handler),
        )
        .route(
            "/api/users/password-reset/request",
            post(handlers::users::password_reset_request_handler),
        )
        .route("/api/users/logout", post(handlers::session::logout_handler));

    Ok(Router::new()
        .merge(public_routes)
        .merge(user_routes::build_profile_routes())
        .merge(user_routes::build_user_admin_routes())
        .merge(user_routes::build_role_routes())
        .layer(from_fn_with_state(app_state.clone(), middleware::authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}
