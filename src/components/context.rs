/// Template context assembly
///
/// A component instance is the set of records of its models that share one
/// id. Each record goes into the container under its model's lowercase name;
/// templates reach it as `component.<model>.<field>`.
use crate::logger::{self, LogTag};
use crate::models::ModelKind;
use crate::store::Store;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Records of one component instance keyed by lowercase model name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelContainer {
    models: Map<String, Value>,
}

impl ModelContainer {
    pub fn add(&mut self, kind: &ModelKind, data: Value) {
        self.models.insert(kind.context_key(), data);
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.models)
    }

    /// Fetch every model's record with `id`
    ///
    /// Kinds without a record are skipped, as are kinds whose fetch fails
    /// (logged as an error). `None` when nothing was found.
    pub async fn collect(kinds: &[ModelKind], id: Uuid, store: &dyn Store) -> Option<Self> {
        let mut container = Self::default();

        for kind in kinds {
            match store.fetch_one(kind, id).await {
                Ok(Some(record)) => container.add(kind, record.data),
                Ok(None) => {}
                Err(e) => logger::error(
                    LogTag::Store,
                    &format!("Failed to fetch {} {}: {}", kind, id, e),
                ),
            }
        }

        if container.is_empty() {
            None
        } else {
            Some(container)
        }
    }
}

/// `{"component": {...}}`
pub fn single_context(container: ModelContainer) -> Value {
    let mut root = Map::new();
    root.insert("component".to_string(), container.into_value());
    Value::Object(root)
}

/// Ids of every instance, enumerated from the first model kind
///
/// A failed listing is logged and yields no ids.
pub async fn instance_ids(kinds: &[ModelKind], store: &dyn Store) -> Vec<Uuid> {
    let Some(primary) = kinds.first() else {
        return Vec::new();
    };

    match store.fetch_all(primary).await {
        Ok(entries) => entries.into_iter().filter_map(|entry| entry.id).collect(),
        Err(e) => {
            logger::error(
                LogTag::Store,
                &format!("Failed to list {} records: {}", primary, e),
            );
            Vec::new()
        }
    }
}

/// `{"components": [<instance context>, ...]}`; `None` when empty
pub fn collection_context(contexts: Vec<Value>) -> Option<Value> {
    if contexts.is_empty() {
        return None;
    }

    let mut root = Map::new();
    root.insert("components".to_string(), Value::Array(contexts));
    Some(Value::Object(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;
    use crate::models::Model;
    use crate::store::SqliteStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_collect_keys_by_lowercase_model_name() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        store.create(&header(id, "a")).unwrap();
        store.create(&detail(id, "b")).unwrap();

        let container = ModelContainer::collect(&[Header::kind(), Detail::kind()], id, &store)
            .await
            .unwrap();
        assert_eq!(container.len(), 2);

        let context = single_context(container);
        assert_eq!(context["component"]["header"]["text"], "a");
        assert_eq!(context["component"]["detail"]["text2"], "b");
    }

    #[tokio::test]
    async fn test_collect_skips_absent_models() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        store.create(&detail(id, "b")).unwrap();

        let kinds = [Header::kind(), Detail::kind()];
        let container = ModelContainer::collect(&kinds, id, &store).await.unwrap();
        assert_eq!(
            container.into_value(),
            json!({ "detail": { "id": id.to_string(), "text2": "b" } })
        );

        assert!(ModelContainer::collect(&kinds, Uuid::new_v4(), &store)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_instances_come_from_primary_model() {
        let store = SqliteStore::open_in_memory().unwrap();
        let with_header = Uuid::new_v4();
        let detail_only = Uuid::new_v4();
        store.create(&header(with_header, "a")).unwrap();
        store.create(&detail(detail_only, "orphan")).unwrap();

        let ids = instance_ids(&[Header::kind(), Detail::kind()], &store).await;
        assert_eq!(ids, vec![with_header]);

        assert!(instance_ids(&[], &store).await.is_empty());
        assert!(instance_ids(&[Footer::kind()], &store).await.is_empty());
    }

    #[test]
    fn test_collection_context_shape() {
        assert!(collection_context(Vec::new()).is_none());

        let context = collection_context(vec![json!({ "component": { "header": 1 } })]).unwrap();
        assert_eq!(context["components"][0]["component"]["header"], 1);
    }
}
