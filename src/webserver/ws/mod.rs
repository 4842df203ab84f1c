/// WebSocket layer
///
/// One connection per browser tab; the client subscribes to components by name
/// and receives rendered fragments whenever their data changes.
///
/// ## Key Components
/// - `clients`: connection registry, subscriptions and broadcast fan-out
/// - `connection`: WebSocket lifecycle and request handling
/// - `message`: wire message schema
/// - `metrics`: hub counters for monitoring
pub mod clients;
pub mod connection;
pub mod message;
pub mod metrics;

pub use clients::{ClientRegistry, ConnectionId, ConnectionSender};
pub use message::{Message, Reply, UpdateAction};
pub use metrics::{HubMetrics, HubMetricsSnapshot};
