//! Health endpoint payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::hub::HubStats;

/// `GET /health` response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` when the hub answered.
    pub status: String,
    /// RFC 3339 time the response was produced.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
    /// Hub counters at the time of the request.
    pub hub: HubStatsDto,
}

/// Hub counters as exposed over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HubStatsDto {
    /// Connected members.
    pub members: usize,
    /// Total joins.
    pub joined: u64,
    /// Total leaves.
    pub left: u64,
    /// Slow consumers removed.
    pub evicted: u64,
    /// Messages fanned out.
    pub broadcasts: u64,
    /// Deliveries dropped for full or closed queues.
    pub dropped_deliveries: u64,
}

impl From<HubStats> for HubStatsDto {
    fn from(stats: HubStats) -> Self {
        Self {
            members: stats.members,
            joined: stats.joined,
            left: stats.left,
            evicted: stats.evicted,
            broadcasts: stats.broadcasts,
            dropped_deliveries: stats.dropped_deliveries,
        }
    }
}
