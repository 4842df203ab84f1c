/// Mist engine
///
/// Owns the component registry, the connection registry, the change pipeline
/// and the two collaborators they need (store and renderer). Construct one per
/// application and share it through `Arc`.
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::components::{ChangeHookInstaller, Component, ComponentRegistry};
use crate::logger::{self, LogTag};
use crate::models::ModelKind;
use crate::pipeline::ChangePipeline;
use crate::store::Store;
use crate::templates::Renderer;
use crate::webserver::ws::ClientRegistry;

pub struct Mist {
    components: Arc<ComponentRegistry>,
    clients: Arc<ClientRegistry>,
    pipeline: Arc<ChangePipeline>,
    store: Arc<dyn Store>,
    renderer: Arc<dyn Renderer>,
    /// Model kinds whose store hook is in place; survives `reset`
    hooked: Mutex<HashSet<ModelKind>>,
}

impl Mist {
    pub fn new(store: Arc<dyn Store>, renderer: Arc<dyn Renderer>) -> Arc<Self> {
        let components = Arc::new(ComponentRegistry::new());
        let clients = Arc::new(ClientRegistry::new(components.clone()));
        let pipeline = Arc::new(ChangePipeline::new(
            components.clone(),
            clients.clone(),
            store.clone(),
            renderer.clone(),
        ));

        Arc::new(Self {
            components,
            clients,
            pipeline,
            store,
            renderer,
            hooked: Mutex::new(HashSet::new()),
        })
    }

    /// Register a component and start observing its models
    ///
    /// Returns false if a component with that name is already registered.
    pub async fn register<C: Component>(&self, definition: C) -> bool {
        self.components.register(definition, self).await
    }

    /// Register several type-erased definitions; returns how many were added
    pub async fn register_all(&self, definitions: Vec<Arc<dyn Component>>) -> usize {
        let mut added = 0;
        for definition in definitions {
            if self.components.register_arc(definition, Some(self)).await {
                added += 1;
            }
        }
        added
    }

    pub fn components(&self) -> &Arc<ComponentRegistry> {
        &self.components
    }

    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }

    pub fn pipeline(&self) -> &Arc<ChangePipeline> {
        &self.pipeline
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    /// Clear both registries (test isolation)
    ///
    /// Store hooks stay installed; re-registering a component does not add a
    /// second hook for a model that is already observed.
    pub async fn reset(&self) {
        self.components.reset().await;
        self.clients.reset().await;
        logger::debug(LogTag::System, "Mist registries reset");
    }
}

impl ChangeHookInstaller for Mist {
    fn install(&self, kind: ModelKind) {
        if !self.hooked.lock().insert(kind) {
            return;
        }
        self.store.on_mutation(kind, self.pipeline.listener());
        logger::debug(
            LogTag::Pipeline,
            &format!("Observing store mutations of {}", kind),
        );
    }
}
