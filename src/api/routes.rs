//! API Routes
//!
//! Router assembly and middleware ordering.

use axum::{middleware, response::Redirect, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::middleware::{docs_auth_middleware, logging_middleware, trace_middleware};
use super::openapi::ApiDoc;
use super::AppState;
use crate::controllers;

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    // Swagger UI plus the raw document, both behind the basic-auth gate.
    let docs: Router<AppState> = SwaggerUi::new("/docs")
        .url("/docs/openapi.json", ApiDoc::openapi())
        .into();
    let docs = docs.layer(middleware::from_fn_with_state(
        state.clone(),
        docs_auth_middleware,
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Note: Axum layers are applied in reverse order (last added = outermost),
    // so the request passes span wrapper -> CORS -> logging -> handler.
    Router::new()
        .route("/", get(root_redirect))
        .route("/health", get(health_check))
        .merge(docs)
        .nest("/api/v1", controllers::router())
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors)
        .layer(middleware::from_fn(trace_middleware))
        .with_state(state)
}

/// Redirect the document root to the documentation index.
async fn root_redirect() -> Redirect {
    Redirect::to("/docs/index.html")
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server alive")
    )
)]
pub async fn health_check() -> &'static str {
    "OK"
}
