/// Connection registry
///
/// Tracks every open WebSocket connection, its outbound queue and the set of
/// components it subscribed to. Subscriptions are validated against the
/// component registry when they are made; broadcasts fan an encoded update out
/// to the subscribers of its component.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::components::ComponentRegistry;
use crate::errors::MistError;
use crate::logger::{self, LogTag};

use super::message::Message;
use super::metrics::HubMetrics;

/// Connection ID (random per WebSocket connection)
pub type ConnectionId = Uuid;

/// Per-connection sender (bounded channel of encoded frames)
pub type ConnectionSender = mpsc::Sender<String>;

struct Client {
    sender: ConnectionSender,
    subscriptions: HashSet<String>,
}

pub struct ClientRegistry {
    components: Arc<ComponentRegistry>,
    clients: RwLock<HashMap<ConnectionId, Client>>,
    metrics: Arc<HubMetrics>,
}

impl ClientRegistry {
    pub fn new(components: Arc<ComponentRegistry>) -> Self {
        Self {
            components,
            clients: RwLock::new(HashMap::new()),
            metrics: HubMetrics::new(),
        }
    }

    /// Register a connection with no subscriptions
    ///
    /// An existing entry with the same id is replaced.
    pub async fn add(&self, id: ConnectionId, sender: ConnectionSender) {
        let replaced = self
            .clients
            .write()
            .await
            .insert(
                id,
                Client {
                    sender,
                    subscriptions: HashSet::new(),
                },
            )
            .is_some();

        if replaced {
            logger::warning(
                LogTag::Clients,
                &format!("Connection {} registered twice, previous entry replaced", id),
            );
        } else {
            self.metrics.connection_opened();
        }

        logger::debug(
            LogTag::Clients,
            &format!("Connection {} registered (active={})", id, self.len().await),
        );
    }

    pub async fn remove(&self, id: ConnectionId) {
        let removed = self.clients.write().await.remove(&id).is_some();
        if removed {
            self.metrics.connection_closed();
            logger::debug(
                LogTag::Clients,
                &format!("Connection {} unregistered (active={})", id, self.len().await),
            );
        }
    }

    /// Subscribe a connection to a component
    ///
    /// Returns false, without changing anything, when the component is not
    /// registered or the connection is unknown.
    pub async fn add_subscription(&self, component: &str, id: ConnectionId) -> bool {
        if !self.components.exists(component).await {
            self.metrics.subscription_rejected();
            logger::debug(
                LogTag::Clients,
                &format!("Connection {}: unknown component '{}'", id, component),
            );
            return false;
        }

        let mut clients = self.clients.write().await;
        let Some(client) = clients.get_mut(&id) else {
            self.metrics.subscription_rejected();
            logger::debug(
                LogTag::Clients,
                &format!("Subscription to '{}' for unknown connection {}", component, id),
            );
            return false;
        };

        if client.subscriptions.insert(component.to_string()) {
            self.metrics.subscription_added();
            logger::debug(
                LogTag::Clients,
                &format!("Connection {} subscribed to '{}'", id, component),
            );
        }
        true
    }

    pub async fn remove_subscription(&self, component: &str, id: ConnectionId) {
        if let Some(client) = self.clients.write().await.get_mut(&id) {
            if client.subscriptions.remove(component) {
                logger::debug(
                    LogTag::Clients,
                    &format!("Connection {} unsubscribed from '{}'", id, component),
                );
            }
        }
    }

    /// Send a component update to every subscriber of its component
    ///
    /// Sends never wait: a subscriber whose queue is full or closed misses
    /// this update, which is counted as dropped. The connection stays
    /// registered; removal is up to the connection handler. Returns the
    /// number of subscribers targeted.
    pub async fn broadcast(&self, message: &Message) -> Result<usize, MistError> {
        let Message::ComponentUpdate { component, .. } = message else {
            return Err(MistError::InvalidBroadcast {
                kind: message.kind(),
            });
        };

        let text = message.encode()?;

        let clients = self.clients.read().await;
        let mut targeted = 0;
        let mut sent = 0;
        let mut dropped = 0;

        for (conn_id, client) in clients.iter() {
            if !client.subscriptions.contains(component) {
                continue;
            }
            targeted += 1;

            match client.sender.try_send(text.clone()) {
                Ok(()) => {
                    sent += 1;
                    self.metrics.message_sent();
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    dropped += 1;
                    self.metrics.message_dropped(1);
                    logger::debug(
                        LogTag::Clients,
                        &format!("Message dropped for connection {} (queue full)", conn_id),
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    dropped += 1;
                    self.metrics.message_dropped(1);
                    logger::debug(
                        LogTag::Clients,
                        &format!("Message dropped for connection {} (closed)", conn_id),
                    );
                }
            }
        }
        drop(clients);

        self.metrics.broadcast_issued();

        logger::verbose(
            LogTag::Clients,
            &format!(
                "Broadcast {} to {} subscriber(s) (sent={}, dropped={})",
                message, targeted, sent, dropped
            ),
        );

        Ok(targeted)
    }

    /// Connections subscribed to `component`
    pub async fn subscribers(&self, component: &str) -> Vec<ConnectionId> {
        self.clients
            .read()
            .await
            .iter()
            .filter(|(_, client)| client.subscriptions.contains(component))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Components a connection is subscribed to, sorted; `None` if unknown
    pub async fn subscriptions(&self, id: ConnectionId) -> Option<Vec<String>> {
        self.clients.read().await.get(&id).map(|client| {
            let mut names: Vec<String> = client.subscriptions.iter().cloned().collect();
            names.sort();
            names
        })
    }

    pub async fn connection_ids(&self) -> Vec<ConnectionId> {
        self.clients.read().await.keys().copied().collect()
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.clients.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn metrics(&self) -> Arc<HubMetrics> {
        self.metrics.clone()
    }

    /// Drop every connection and zero the metrics (test isolation)
    pub async fn reset(&self) {
        self.clients.write().await.clear();
        self.metrics.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fixtures::{Banner, Row};
    use std::time::Duration;
    use tokio::time::timeout;

    async fn registry_with_components() -> ClientRegistry {
        let components = Arc::new(ComponentRegistry::new());
        components.register_without_listener(Row).await;
        components.register_without_listener(Banner).await;
        ClientRegistry::new(components)
    }

    async fn connect(registry: &ClientRegistry) -> (ConnectionId, mpsc::Receiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(8);
        registry.add(id, tx).await;
        (id, rx)
    }

    #[tokio::test]
    async fn test_add_and_remove() {
        let registry = registry_with_components().await;
        let (first, _rx1) = connect(&registry).await;
        let (second, _rx2) = connect(&registry).await;

        assert_eq!(registry.len().await, 2);
        assert_ne!(first, second);

        registry.remove(first).await;
        registry.remove(first).await;
        assert_eq!(registry.len().await, 1);
        assert!(registry.contains(second).await);
        assert_eq!(registry.metrics().snapshot().active_connections, 1);
    }

    #[tokio::test]
    async fn test_subscription_validation() {
        let registry = registry_with_components().await;
        let (id, _rx) = connect(&registry).await;

        assert!(!registry.add_subscription("Nope", id).await);
        assert!(!registry.add_subscription("Row", Uuid::new_v4()).await);
        assert_eq!(registry.subscriptions(id).await, Some(vec![]));

        assert!(registry.add_subscription("Row", id).await);
        assert!(registry.add_subscription("Row", id).await);
        assert_eq!(registry.subscriptions(id).await, Some(vec!["Row".to_string()]));

        registry.remove_subscription("Row", id).await;
        registry.remove_subscription("Row", id).await;
        registry.remove_subscription("Row", Uuid::new_v4()).await;
        assert_eq!(registry.subscriptions(id).await, Some(vec![]));

        let snapshot = registry.metrics().snapshot();
        assert_eq!(snapshot.total_subscriptions, 1);
        assert_eq!(snapshot.rejected_subscriptions, 2);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers_only() {
        let registry = registry_with_components().await;
        let (subscribed, mut subscribed_rx) = connect(&registry).await;
        let (other, mut other_rx) = connect(&registry).await;
        registry.add_subscription("Row", subscribed).await;
        registry.add_subscription("Banner", other).await;

        let id = Uuid::new_v4();
        let update = Message::component_update("Row", Some(id), "<tr></tr>");
        assert_eq!(registry.broadcast(&update).await.unwrap(), 1);

        let received = timeout(Duration::from_secs(1), subscribed_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Message::decode(&received).unwrap(), update);

        assert!(timeout(Duration::from_millis(50), other_rx.recv())
            .await
            .is_err());
        assert_eq!(registry.subscribers("Row").await, vec![subscribed]);
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers() {
        let registry = registry_with_components().await;
        let _conn = connect(&registry).await;

        let update = Message::component_update("Row", None, "x");
        assert_eq!(registry.broadcast(&update).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_rejects_control_messages() {
        let registry = registry_with_components().await;
        let result = registry.broadcast(&Message::subscribe("Row")).await;
        assert!(matches!(
            result,
            Err(MistError::InvalidBroadcast { kind: "subscribe" })
        ));
    }

    #[tokio::test]
    async fn test_failed_send_keeps_connection() {
        let registry = registry_with_components().await;
        let (id, rx) = connect(&registry).await;
        registry.add_subscription("Row", id).await;
        drop(rx);

        let update = Message::component_update("Row", None, "x");
        assert_eq!(registry.broadcast(&update).await.unwrap(), 1);

        assert_eq!(registry.metrics().snapshot().total_messages_dropped, 1);
        assert!(registry.contains(id).await);
        assert_eq!(registry.subscribers("Row").await, vec![id]);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let registry = registry_with_components().await;
        let id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(1);
        registry.add(id, tx).await;
        registry.add_subscription("Row", id).await;

        let update = Message::component_update("Row", None, "x");
        let all = async {
            for _ in 0..100 {
                registry.broadcast(&update).await.unwrap();
            }
        };
        timeout(Duration::from_secs(1), all).await.unwrap();

        let snapshot = registry.metrics().snapshot();
        assert_eq!(snapshot.total_broadcasts, 100);
        assert_eq!(snapshot.total_messages_sent, 1);
        assert_eq!(snapshot.total_messages_dropped, 99);

        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
        assert!(registry.contains(id).await);
    }

    #[tokio::test]
    async fn test_duplicate_id_replaces_entry() {
        let registry = registry_with_components().await;
        let id = Uuid::new_v4();
        let (old_tx, _old_rx) = mpsc::channel(1);
        let (new_tx, mut new_rx) = mpsc::channel(1);

        registry.add(id, old_tx).await;
        registry.add_subscription("Row", id).await;
        registry.add(id, new_tx).await;

        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.subscriptions(id).await, Some(vec![]));

        registry.add_subscription("Row", id).await;
        registry
            .broadcast(&Message::component_update("Row", None, "x"))
            .await
            .unwrap();
        assert!(timeout(Duration::from_secs(1), new_rx.recv())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_reset() {
        let registry = registry_with_components().await;
        let _conn = connect(&registry).await;
        registry.reset().await;
        assert!(registry.is_empty().await);
        assert_eq!(registry.metrics().snapshot().total_connections, 0);
    }
}
