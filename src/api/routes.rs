//! Application route configuration.

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    BoxError, Router,
};
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    auth_routes, health_check, medical_routes, performance_routes, root, search_routes,
};
use super::middleware::{auth_middleware, rate_limit_auth_middleware, rate_limit_middleware};
use super::openapi::ApiDoc;
use super::AppState;
use crate::config::MAX_UPLOAD_BYTES;
use crate::errors::AppError;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.http.cors_origins);
    let timeout = state.http.request_timeout;

    Router::new()
        // Health check endpoints (no rate limiting)
        .route("/", get(root))
        .route("/health", get(health_check))
        // OpenAPI Swagger UI documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public authentication routes (stricter rate limiting)
        .nest(
            "/auth",
            auth_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_auth_middleware,
            )),
        )
        // Doctor routes (require JWT + general rate limiting)
        .nest(
            "/api",
            protected(
                medical_routes().nest("/performance", performance_routes()),
                &state,
            ),
        )
        .nest("/gemini", protected(search_routes(), &state))
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .timeout(timeout),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JWT check inside the general rate limit.
fn protected(routes: Router<AppState>, state: &AppState) -> Router<AppState> {
    routes
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, ACCEPT])
        .allow_credentials(true)
}

async fn handle_timeout_error(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        tracing::error!("Request timed out");
        AppError::Timeout.into_response()
    } else {
        AppError::internal(format!("Unhandled middleware error: {}", err)).into_response()
    }
}
