use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use pmaas_core::AppError;
use tower_http::cors::CorsLayer;
use url::Url;

/// Allows the configured frontend origin to call the API with cookies.
pub(super) fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    let origin = Url::parse(frontend_url)
        .map_err(|error| AppError::Validation(format!("invalid FRONTEND_URL: {error}")))?
        .origin()
        .ascii_serialization();

    Ok(CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(origin.as_str())
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]))
}
