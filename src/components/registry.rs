/// Component registry
///
/// Append-only, insertion-ordered and unique by name. An index from model kind
/// to component positions answers "who renders from this model" without a
/// scan. All access goes through one `RwLock`; hook installation and anything
/// else that leaves the registry happens after the lock is released.
use super::{Component, RegisteredComponent};
use crate::logger::{self, LogTag};
use crate::models::ModelKind;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Wires store change observation for a model kind
///
/// Called at most once per distinct kind, the first time a registered
/// component depends on it.
pub trait ChangeHookInstaller: Send + Sync {
    fn install(&self, kind: ModelKind);
}

#[derive(Default)]
struct RegistryInner {
    components: Vec<Arc<RegisteredComponent>>,
    by_model: HashMap<ModelKind, Vec<usize>>,
}

#[derive(Default)]
pub struct ComponentRegistry {
    inner: RwLock<RegistryInner>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component and install hooks for models seen for the first time
    ///
    /// Returns false when a component with the same name already exists (the
    /// first registration wins) or when the definition lists no models.
    pub async fn register<C: Component>(
        &self,
        definition: C,
        installer: &dyn ChangeHookInstaller,
    ) -> bool {
        self.register_arc(Arc::new(definition), Some(installer)).await
    }

    /// Register without installing store hooks (tests, manual wiring)
    pub async fn register_without_listener<C: Component>(&self, definition: C) -> bool {
        self.register_arc(Arc::new(definition), None).await
    }

    pub async fn register_arc(
        &self,
        definition: Arc<dyn Component>,
        installer: Option<&dyn ChangeHookInstaller>,
    ) -> bool {
        let component = RegisteredComponent::new(definition);

        if component.models().is_empty() {
            logger::warning(
                LogTag::Components,
                &format!(
                    "Component '{}' depends on no models and was not registered",
                    component.name()
                ),
            );
            return false;
        }

        let new_kinds = {
            let mut inner = self.inner.write().await;

            if inner.components.iter().any(|c| c.name() == component.name()) {
                logger::debug(
                    LogTag::Components,
                    &format!("Component '{}' already registered, skipping", component.name()),
                );
                return false;
            }

            let position = inner.components.len();
            let mut new_kinds = Vec::new();
            for kind in component.models() {
                let users = inner.by_model.entry(*kind).or_default();
                if users.is_empty() {
                    new_kinds.push(*kind);
                }
                // A component listing the same model twice is indexed once
                if users.last() != Some(&position) {
                    users.push(position);
                }
            }

            logger::info(
                LogTag::Components,
                &format!(
                    "Registered component '{}' (template '{}', models [{}])",
                    component.name(),
                    component.template().label(),
                    component
                        .models()
                        .iter()
                        .map(|k| k.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            );

            inner.components.push(Arc::new(component));
            new_kinds
        };

        if let Some(installer) = installer {
            for kind in new_kinds {
                installer.install(kind);
            }
        }

        true
    }

    /// Components depending on `kind`, in registration order
    pub async fn components_for(&self, kind: &ModelKind) -> Vec<Arc<RegisteredComponent>> {
        let inner = self.inner.read().await;
        inner
            .by_model
            .get(kind)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&i| inner.components[i].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn exists(&self, name: &str) -> bool {
        self.inner
            .read()
            .await
            .components
            .iter()
            .any(|c| c.name() == name)
    }

    pub async fn get(&self, name: &str) -> Option<Arc<RegisteredComponent>> {
        self.inner
            .read()
            .await
            .components
            .iter()
            .find(|c| c.name() == name)
            .cloned()
    }

    /// All components in registration order
    pub async fn all(&self) -> Vec<Arc<RegisteredComponent>> {
        self.inner.read().await.components.clone()
    }

    pub async fn names(&self) -> Vec<String> {
        self.inner
            .read()
            .await
            .components
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.components.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every component (test isolation)
    pub async fn reset(&self) {
        *self.inner.write().await = RegistryInner::default();
    }
}
