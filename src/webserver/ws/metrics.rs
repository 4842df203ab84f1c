use serde::Serialize;
/// WebSocket hub metrics
///
/// Aggregate counters for the connection registry, exposed by the stats route.
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Hub-level metrics (aggregate across all connections)
#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Total connections (lifetime)
    total_connections: AtomicU64,

    /// Current active connections
    active_connections: AtomicUsize,

    /// Broadcasts issued
    total_broadcasts: AtomicU64,

    /// Messages handed to a connection's outbound queue
    total_messages_sent: AtomicU64,

    /// Messages that could not be queued (connection gone)
    total_messages_dropped: AtomicU64,

    /// Accepted subscribe requests
    total_subscriptions: AtomicU64,

    /// Subscribe requests naming an unknown component or connection
    rejected_subscriptions: AtomicU64,
}

impl HubMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn broadcast_issued(&self) {
        self.total_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_sent(&self) {
        self.total_messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_dropped(&self, count: u64) {
        self.total_messages_dropped
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn subscription_added(&self) {
        self.total_subscriptions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn subscription_rejected(&self) {
        self.rejected_subscriptions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HubMetricsSnapshot {
        HubMetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            total_broadcasts: self.total_broadcasts.load(Ordering::Relaxed),
            total_messages_sent: self.total_messages_sent.load(Ordering::Relaxed),
            total_messages_dropped: self.total_messages_dropped.load(Ordering::Relaxed),
            total_subscriptions: self.total_subscriptions.load(Ordering::Relaxed),
            rejected_subscriptions: self.rejected_subscriptions.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.total_connections.store(0, Ordering::Relaxed);
        self.active_connections.store(0, Ordering::Relaxed);
        self.total_broadcasts.store(0, Ordering::Relaxed);
        self.total_messages_sent.store(0, Ordering::Relaxed);
        self.total_messages_dropped.store(0, Ordering::Relaxed);
        self.total_subscriptions.store(0, Ordering::Relaxed);
        self.rejected_subscriptions.store(0, Ordering::Relaxed);
    }
}

/// Hub metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubMetricsSnapshot {
    pub total_connections: u64,
    pub active_connections: usize,
    pub total_broadcasts: u64,
    pub total_messages_sent: u64,
    pub total_messages_dropped: u64,
    pub total_subscriptions: u64,
    pub rejected_subscriptions: u64,
}
