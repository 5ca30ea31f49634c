//! relkg API - HTTP server
//!
//! Serves the text input form, the rendered knowledge graph page and a JSON
//! extraction endpoint.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{extract, health, pages};
use crate::state::AppState;

/// OpenAPI document
#[derive(OpenApi)]
#[openapi(
    info(title = "relkg API", description = "Relation extraction and knowledge graph rendering"),
    paths(
        health::health_check,
        health::metrics,
        extract::extract,
        pages::process,
    ),
    components(schemas(
        health::HealthResponse,
        health::MetricsResponse,
        extract::ExtractRequest,
        extract::ExtractResponse,
        pages::ProcessForm,
        error::ApiError,
    )),
    tags(
        (name = "health", description = "Liveness and metrics"),
        (name = "extraction", description = "Triplet extraction")
    )
)]
pub struct ApiDoc;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;
    let cors = cors_layer(&server.cors_origins);
    let body_limit = RequestBodyLimitLayer::new(server.max_body_size);

    Router::new()
        .route("/", get(pages::index))
        .route("/process", post(pages::process))
        .route("/api/v1/extract", post(extract::extract))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(from_fn_with_state(
            Arc::clone(&state),
            middleware::request_counter_middleware,
        ))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS layer for the configured origins; `*` allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
