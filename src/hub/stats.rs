//! Point-in-time counters reported by the hub event loop.

/// Snapshot of hub membership and fan-out counters.
///
/// Produced by the hub loop itself in answer to a
/// [`super::HubHandle::stats`] query, so it never races a membership
/// change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Members joined right now.
    pub members: usize,
    /// Total joins processed.
    pub joined: u64,
    /// Total leaves that removed a member.
    pub left: u64,
    /// Members forcibly removed because their queue was full.
    pub evicted: u64,
    /// Messages fanned out.
    pub broadcasts: u64,
    /// Per-member deliveries that were dropped (full or closed queue).
    pub dropped_deliveries: u64,
}
