//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use futures_util::StreamExt;

use super::connection::ConnectionPump;
use crate::app_state::AppState;
use crate::error::RelayError;

/// `GET /room`: upgrade HTTP connection to WebSocket.
///
/// The session is resolved before the upgrade; a rejected session answers
/// `401` and no hub member is ever created for it.
#[utoipa::path(
    get,
    path = "/room",
    tag = "Relay",
    summary = "Join the relay",
    description = "Upgrades to a WebSocket. Send `{\"body\": \"...\"}` frames; receive `{\"sender\", \"body\", \"timestamp\"}` frames.",
    responses(
        (status = 101, description = "Switching protocols"),
        (status = 401, description = "Missing or invalid session cookie", body = crate::error::ErrorResponse),
    )
)]
pub async fn room_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, RelayError> {
    let identity = state.session.resolve(&jar)?;
    tracing::debug!(name = %identity.name(), "session accepted, upgrading");

    let pump = ConnectionPump::new(state.hub, identity, state.pump);
    Ok(ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        let outcome = pump.run(sink, stream).await;
        tracing::debug!(?outcome, "connection finished");
    }))
}
