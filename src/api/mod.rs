//! HTTP API layer: route handlers, DTOs, OpenAPI document and router
//! composition.

pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::room_handler;

/// Builds the router with every HTTP and WebSocket endpoint.
pub fn build_router() -> Router<AppState> {
    mount_docs(
        Router::new()
            .route("/room", get(room_handler))
            .merge(handlers::system::routes()),
    )
}

/// Serves Swagger UI at `/swagger-ui` and the raw document at
/// `/api-docs/openapi.json`.
#[cfg(feature = "swagger-ui")]
fn mount_docs(router: Router<AppState>) -> Router<AppState> {
    use utoipa::OpenApi;

    router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
    )
}

#[cfg(not(feature = "swagger-ui"))]
const fn mount_docs(router: Router<AppState>) -> Router<AppState> {
    router
}

/// Builds the full application: routes, tracing and CORS layers, state.
pub fn build_app(state: AppState) -> Router {
    build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
