//! Shared application state injected into all Axum handlers.

use crate::hub::HubHandle;
use crate::session::SessionPolicy;
use crate::ws::connection::PumpSettings;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Intake side of the broadcast hub.
    pub hub: HubHandle,
    /// Decides whether an upgrade needs an `auth` cookie.
    pub session: SessionPolicy,
    /// Settings applied to every connection pump.
    pub pump: PumpSettings,
}
