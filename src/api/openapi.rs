//! OpenAPI document for the HTTP surface.

use utoipa::OpenApi;

use crate::api::dto::{HealthResponse, HubStatsDto};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI description of every route.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "chat-relay", description = "Real-time WebSocket message relay"),
    paths(
        crate::api::handlers::system::health_handler,
        crate::ws::handler::room_handler,
    ),
    components(schemas(HealthResponse, HubStatsDto, ErrorResponse, ErrorBody)),
    tags(
        (name = "System", description = "Service status"),
        (name = "Relay", description = "WebSocket relay"),
    )
)]
pub struct ApiDoc;
