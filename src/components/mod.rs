/// Components: named, template-backed fragments driven by one or more models
///
/// An application describes a component by implementing `Component`. The
/// registry stores every definition behind `RegisteredComponent`, which gives
/// the pipeline one uniform handle regardless of the concrete type.
use crate::errors::RenderError;
use crate::models::{ModelKind, Record};
use crate::store::Store;
use crate::templates::{Renderer, Template};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub mod context;
pub mod registry;

pub use context::{collection_context, instance_ids, single_context, ModelContainer};
pub use registry::{ChangeHookInstaller, ComponentRegistry};

#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Unique component name; defaults to the implementing type's name
    fn name(&self) -> String {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Template to render; defaults to the template named like the component
    fn template(&self) -> Template {
        Template::Named(self.name())
    }

    /// Model kinds joined by their common id, in context order
    fn models(&self) -> Vec<ModelKind>;

    /// Whether a change to `record` requires this component to re-render
    fn should_update(&self, record: &Record) -> bool {
        self.models().contains(&record.kind)
    }

    /// Context for the component instance identified by `id`
    ///
    /// `None` when none of the component's models has a record with that id.
    async fn make_context(&self, id: Uuid, store: &dyn Store) -> Option<Value> {
        ModelContainer::collect(&self.models(), id, store)
            .await
            .map(single_context)
    }

    /// Context holding every instance of the component
    ///
    /// Instances are enumerated from the first model kind and each one goes
    /// through `make_context`; ids without a context are skipped. `None` when
    /// nothing was collected.
    async fn make_collection_context(&self, store: &dyn Store) -> Option<Value> {
        let mut contexts = Vec::new();
        for id in instance_ids(&self.models(), store).await {
            if let Some(context) = self.make_context(id, store).await {
                contexts.push(context);
            }
        }
        collection_context(contexts)
    }

    /// Render the instance identified by `id`
    ///
    /// `Ok(None)` means there was no data for `id`, which is not an error.
    async fn render(
        &self,
        id: Uuid,
        store: &dyn Store,
        renderer: &dyn Renderer,
    ) -> Result<Option<String>, RenderError> {
        let Some(context) = self.make_context(id, store).await else {
            return Ok(None);
        };
        renderer.render(&self.template(), &context).map(Some)
    }
}

/// Last path segment of a type name, without generic arguments
fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Type-erased component as stored in the registry
pub struct RegisteredComponent {
    name: String,
    template: Template,
    models: Vec<ModelKind>,
    definition: Arc<dyn Component>,
}

impl RegisteredComponent {
    pub fn new(definition: Arc<dyn Component>) -> Self {
        Self {
            name: definition.name(),
            template: definition.template(),
            models: definition.models(),
            definition,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn models(&self) -> &[ModelKind] {
        &self.models
    }

    pub fn should_update(&self, record: &Record) -> bool {
        self.definition.should_update(record)
    }

    pub async fn render(
        &self,
        id: Uuid,
        store: &dyn Store,
        renderer: &dyn Renderer,
    ) -> Result<Option<String>, RenderError> {
        self.definition.render(id, store, renderer).await
    }

    /// Render every instance and concatenate the fragments
    ///
    /// Each entry of the collection context is rendered as-is with the
    /// component's template.
    pub async fn render_all(
        &self,
        store: &dyn Store,
        renderer: &dyn Renderer,
    ) -> Result<Option<String>, RenderError> {
        let Some(context) = self.definition.make_collection_context(store).await else {
            return Ok(None);
        };

        let mut html = String::new();
        if let Some(Value::Array(instances)) = context.get("components") {
            for instance in instances {
                html.push_str(&renderer.render(&self.template, instance)?);
            }
        }
        Ok(Some(html))
    }
}

impl std::fmt::Debug for RegisteredComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredComponent")
            .field("name", &self.name)
            .field("template", &self.template)
            .field("models", &self.models)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::fixtures::*;
    use crate::models::Model;
    use crate::store::SqliteStore;
    use crate::templates::TemplateRenderer;

    #[test]
    fn test_default_name_and_template() {
        let row = RegisteredComponent::new(Arc::new(Row));
        assert_eq!(row.name(), "Row");
        assert_eq!(row.models(), &[Header::kind(), Detail::kind()]);

        struct Plain;
        impl Component for Plain {
            fn models(&self) -> Vec<ModelKind> {
                vec![Header::kind()]
            }
        }
        let plain = RegisteredComponent::new(Arc::new(Plain));
        assert_eq!(plain.name(), "Plain");
        assert_eq!(plain.template(), &Template::named("Plain"));
    }

    #[test]
    fn test_should_update_by_kind_identity() {
        let id = Uuid::new_v4();
        let banner = RegisteredComponent::new(Arc::new(Banner));

        let header_record = Record::from_model(&header(id, "a")).unwrap();
        let detail_record = Record::from_model(&detail(id, "b")).unwrap();
        let impostor = Record::from_model(&HeaderImpostor {
            id: Some(id),
            text: "a".to_string(),
        })
        .unwrap();

        assert!(banner.should_update(&header_record));
        assert!(!banner.should_update(&detail_record));
        assert!(!banner.should_update(&impostor));
    }

    #[tokio::test]
    async fn test_render_joins_models_by_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        let renderer = TemplateRenderer::new();
        let id = Uuid::new_v4();
        store.create(&header(id, "a")).unwrap();
        store.create(&detail(id, "b")).unwrap();

        let row = RegisteredComponent::new(Arc::new(Row));
        let html = row.render(id, &store, &renderer).await.unwrap();
        assert_eq!(html.as_deref(), Some("<tr><td>a</td><td>b</td></tr>"));
    }

    #[tokio::test]
    async fn test_render_without_data_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        let renderer = TemplateRenderer::new();

        let row = RegisteredComponent::new(Arc::new(Row));
        let html = row.render(Uuid::new_v4(), &store, &renderer).await.unwrap();
        assert!(html.is_none());
    }

    #[tokio::test]
    async fn test_render_with_partial_data() {
        let store = SqliteStore::open_in_memory().unwrap();
        let renderer = TemplateRenderer::new();
        let id = Uuid::new_v4();
        store.create(&header(id, "only header")).unwrap();

        let partial = RegisteredComponent::new(Arc::new(HeaderOnlyRow));
        let html = partial.render(id, &store, &renderer).await.unwrap();
        assert_eq!(html.as_deref(), Some("<p>only header</p>"));

        // A template binding the absent model fails instead
        let row = RegisteredComponent::new(Arc::new(Row));
        assert!(row.render(id, &store, &renderer).await.is_err());
    }

    #[tokio::test]
    async fn test_render_all_concatenates_instances() {
        let store = SqliteStore::open_in_memory().unwrap();
        let renderer = TemplateRenderer::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        store.create(&header(first, "one")).unwrap();
        store.create(&detail(first, "1")).unwrap();
        store.create(&header(second, "two")).unwrap();
        store.create(&detail(second, "2")).unwrap();

        let row = RegisteredComponent::new(Arc::new(Row));
        let html = row.render_all(&store, &renderer).await.unwrap();
        assert_eq!(
            html.as_deref(),
            Some("<tr><td>one</td><td>1</td></tr><tr><td>two</td><td>2</td></tr>")
        );

        store.reset().unwrap();
        assert!(row.render_all(&store, &renderer).await.unwrap().is_none());
    }

    #[test]
    fn test_default_name_strips_generics() {
        assert_eq!(short_type_name("app::ui::Row"), "Row");
        assert_eq!(short_type_name("app::Wrapper<app::Inner>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");

        struct Wrapper<T>(std::marker::PhantomData<fn() -> T>);
        impl<T: 'static> Component for Wrapper<T> {
            fn models(&self) -> Vec<ModelKind> {
                vec![Header::kind()]
            }
        }
        let wrapper = RegisteredComponent::new(Arc::new(Wrapper::<Header>(std::marker::PhantomData)));
        assert_eq!(wrapper.name(), "Wrapper");
    }

    #[tokio::test]
    async fn test_render_all_uses_custom_context() {
        struct Labeled;

        #[async_trait]
        impl Component for Labeled {
            fn template(&self) -> Template {
                Template::inline("<i>{{ label }}:{{ component.header.text }}</i>")
            }

            fn models(&self) -> Vec<ModelKind> {
                vec![Header::kind()]
            }

            async fn make_context(&self, id: Uuid, store: &dyn Store) -> Option<Value> {
                let mut context = ModelContainer::collect(&self.models(), id, store)
                    .await
                    .map(single_context)?;
                context["label"] = Value::from("row");
                Some(context)
            }
        }

        let store = SqliteStore::open_in_memory().unwrap();
        let renderer = TemplateRenderer::new();
        let id = Uuid::new_v4();
        store.create(&header(id, "a")).unwrap();

        let labeled = RegisteredComponent::new(Arc::new(Labeled));
        let single = labeled.render(id, &store, &renderer).await.unwrap();
        let all = labeled.render_all(&store, &renderer).await.unwrap();
        assert_eq!(single.as_deref(), Some("<i>row:a</i>"));
        assert_eq!(all, single);
    }
}
