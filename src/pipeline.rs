/// Change pipeline
///
/// Turns a store mutation into pushed HTML: find the components that render
/// from the changed model, render each one for the record's id and broadcast
/// the fragments to their subscribers. Nothing here reports failure to the
/// caller; every problem is logged and the remaining components carry on.
use futures::future::join_all;
use futures::FutureExt;
use std::sync::{Arc, Weak};

use crate::components::{ComponentRegistry, RegisteredComponent};
use crate::logger::{self, LogTag};
use crate::models::Record;
use crate::store::{MutationHandler, Store};
use crate::templates::Renderer;
use crate::webserver::ws::{ClientRegistry, Message};

pub struct ChangePipeline {
    components: Arc<ComponentRegistry>,
    clients: Arc<ClientRegistry>,
    store: Arc<dyn Store>,
    renderer: Arc<dyn Renderer>,
}

impl ChangePipeline {
    pub fn new(
        components: Arc<ComponentRegistry>,
        clients: Arc<ClientRegistry>,
        store: Arc<dyn Store>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            components,
            clients,
            store,
            renderer,
        }
    }

    /// Re-render and broadcast every component affected by `record`
    ///
    /// Returns the number of broadcasts issued.
    pub async fn on_mutation(&self, record: Record) -> usize {
        let Some(id) = record.id else {
            logger::verbose(
                LogTag::Pipeline,
                &format!("Ignoring {} mutation without id", record.kind),
            );
            return 0;
        };

        let affected: Vec<Arc<RegisteredComponent>> = self
            .components
            .components_for(&record.kind)
            .await
            .into_iter()
            .filter(|component| component.should_update(&record))
            .collect();

        if affected.is_empty() {
            return 0;
        }

        let renders = affected.iter().map(|component| async move {
            let result = component
                .render(id, self.store.as_ref(), self.renderer.as_ref())
                .await;
            (component, result)
        });

        let mut issued = 0;
        for (component, result) in join_all(renders).await {
            let html = match result {
                Ok(Some(html)) => html,
                Ok(None) => {
                    logger::verbose(
                        LogTag::Pipeline,
                        &format!("No data for component '{}' id {}", component.name(), id),
                    );
                    continue;
                }
                Err(e) => {
                    logger::error(
                        LogTag::Pipeline,
                        &format!(
                            "Failed to render component '{}' id {}: {}",
                            component.name(),
                            id,
                            e
                        ),
                    );
                    continue;
                }
            };

            let update = Message::component_update(component.name(), Some(id), html);
            match self.clients.broadcast(&update).await {
                Ok(subscribers) => {
                    issued += 1;
                    logger::debug(
                        LogTag::Pipeline,
                        &format!(
                            "Component '{}' id {} pushed to {} subscriber(s)",
                            component.name(),
                            id,
                            subscribers
                        ),
                    );
                }
                Err(e) => logger::error(
                    LogTag::Pipeline,
                    &format!("Broadcast for component '{}' failed: {}", component.name(), e),
                ),
            }
        }

        issued
    }

    /// Store hook that feeds mutations into this pipeline
    ///
    /// The hook holds a weak reference; once the pipeline is dropped it does
    /// nothing.
    pub fn listener(self: &Arc<Self>) -> MutationHandler {
        let pipeline: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |record: Record| {
            let pipeline = pipeline.clone();
            async move {
                if let Some(pipeline) = pipeline.upgrade() {
                    pipeline.on_mutation(record).await;
                }
            }
            .boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fixtures::{Banner, Broken, HeaderOnlyRow, Row};
    use crate::models::fixtures::*;
    use crate::models::Model;
    use crate::store::SqliteStore;
    use crate::templates::TemplateRenderer;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;
    use uuid::Uuid;

    struct Fixture {
        store: Arc<SqliteStore>,
        components: Arc<ComponentRegistry>,
        clients: Arc<ClientRegistry>,
        pipeline: Arc<ChangePipeline>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let components = Arc::new(ComponentRegistry::new());
        let clients = Arc::new(ClientRegistry::new(components.clone()));
        let pipeline = Arc::new(ChangePipeline::new(
            components.clone(),
            clients.clone(),
            store.clone(),
            Arc::new(TemplateRenderer::new()),
        ));
        Fixture {
            store,
            components,
            clients,
            pipeline,
        }
    }

    async fn subscriber(fx: &Fixture, component: &str) -> mpsc::Receiver<String> {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(8);
        fx.clients.add(id, tx).await;
        assert!(fx.clients.add_subscription(component, id).await);
        rx
    }

    async fn next_update(rx: &mut mpsc::Receiver<String>) -> Message {
        let text = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        Message::decode(&text).unwrap()
    }

    #[tokio::test]
    async fn test_mutation_renders_and_broadcasts() {
        let fx = fixture();
        fx.components.register_without_listener(Row).await;
        let mut rx = subscriber(&fx, "Row").await;

        let id = Uuid::new_v4();
        fx.store.create(&header(id, "a")).unwrap();
        fx.store.create(&detail(id, "b")).unwrap();

        let record = Record::from_model(&header(id, "a")).unwrap();
        assert_eq!(fx.pipeline.on_mutation(record).await, 1);

        assert_eq!(
            next_update(&mut rx).await,
            Message::component_update("Row", Some(id), "<tr><td>a</td><td>b</td></tr>")
        );
    }

    #[tokio::test]
    async fn test_every_dependent_component_is_pushed() {
        let fx = fixture();
        fx.components.register_without_listener(Row).await;
        fx.components.register_without_listener(Banner).await;
        let mut row_rx = subscriber(&fx, "Row").await;
        let mut banner_rx = subscriber(&fx, "Banner").await;

        let id = Uuid::new_v4();
        fx.store.create(&header(id, "a")).unwrap();
        fx.store.create(&detail(id, "b")).unwrap();

        let issued = fx
            .pipeline
            .on_mutation(Record::from_model(&header(id, "a")).unwrap())
            .await;
        assert_eq!(issued, 2);
        assert_eq!(next_update(&mut row_rx).await.component(), "Row");
        assert_eq!(next_update(&mut banner_rx).await.component(), "Banner");

        // Detail changes concern the row only
        let issued = fx
            .pipeline
            .on_mutation(Record::from_model(&detail(id, "b")).unwrap())
            .await;
        assert_eq!(issued, 1);
    }

    #[tokio::test]
    async fn test_no_data_no_broadcast() {
        let fx = fixture();
        fx.components.register_without_listener(Row).await;
        let mut rx = subscriber(&fx, "Row").await;

        // The record is not in the store, so nothing can be rendered
        let record = Record::from_model(&header(Uuid::new_v4(), "a")).unwrap();
        assert_eq!(fx.pipeline.on_mutation(record).await, 0);
        assert!(timeout(Duration::from_millis(50), rx.recv()).await.is_err());
        assert_eq!(fx.clients.metrics().snapshot().total_broadcasts, 0);
    }

    #[tokio::test]
    async fn test_partial_data_renders() {
        let fx = fixture();
        fx.components.register_without_listener(HeaderOnlyRow).await;
        let mut rx = subscriber(&fx, "HeaderOnlyRow").await;

        let id = Uuid::new_v4();
        fx.store.create(&header(id, "solo")).unwrap();

        let record = Record::from_model(&header(id, "solo")).unwrap();
        assert_eq!(fx.pipeline.on_mutation(record).await, 1);
        assert_eq!(
            next_update(&mut rx).await,
            Message::component_update("HeaderOnlyRow", Some(id), "<p>solo</p>")
        );
    }

    #[tokio::test]
    async fn test_render_failure_does_not_stop_others() {
        let fx = fixture();
        fx.components.register_without_listener(Broken).await;
        fx.components.register_without_listener(Banner).await;
        let mut rx = subscriber(&fx, "Banner").await;

        let id = Uuid::new_v4();
        fx.store.create(&header(id, "still here")).unwrap();

        let record = Record::from_model(&header(id, "still here")).unwrap();
        assert_eq!(fx.pipeline.on_mutation(record).await, 1);
        assert_eq!(
            next_update(&mut rx).await,
            Message::component_update("Banner", Some(id), "<h1>still here</h1>")
        );
    }

    #[tokio::test]
    async fn test_records_without_id_or_dependents_are_ignored() {
        let fx = fixture();
        fx.components.register_without_listener(Banner).await;

        let anonymous = Record::from_model(&Header {
            id: None,
            text: "x".to_string(),
        })
        .unwrap();
        assert_eq!(fx.pipeline.on_mutation(anonymous).await, 0);

        let footer = Record::from_model(&Footer {
            id: Some(Uuid::new_v4()),
            note: "n".to_string(),
        })
        .unwrap();
        assert_eq!(fx.pipeline.on_mutation(footer).await, 0);
    }

    #[tokio::test]
    async fn test_listener_driven_by_store_updates() {
        let fx = fixture();
        fx.components.register_without_listener(Banner).await;
        fx.store.on_mutation(Header::kind(), fx.pipeline.listener());
        let mut rx = subscriber(&fx, "Banner").await;

        let id = Uuid::new_v4();
        fx.store.create(&header(id, "before")).unwrap();
        fx.store.update(&header(id, "after")).await.unwrap();

        assert_eq!(
            next_update(&mut rx).await,
            Message::component_update("Banner", Some(id), "<h1>after</h1>")
        );
    }

    #[tokio::test]
    async fn test_listener_outlived_by_store_is_inert() {
        let fx = fixture();
        fx.store.on_mutation(Header::kind(), fx.pipeline.listener());
        let store = fx.store.clone();
        drop(fx);

        let id = Uuid::new_v4();
        store.create(&header(id, "a")).unwrap();
        store.update(&header(id, "b")).await.unwrap();
    }
}
