/// Data models observed by Mist
///
/// A model is any serde-serializable record type with a stable UUID. The core
/// never looks inside a record: it only needs the model's kind (to pick
/// components) and its id (to correlate the models of one component instance).
use serde::{de::DeserializeOwned, Serialize};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Application record type backed by the store
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable model name
    ///
    /// Used as the store key for this model's records and, lowercased, as the
    /// key of the record inside a component's template context.
    const NAME: &'static str;

    /// Identifier shared by every model of one component instance
    fn id(&self) -> Option<Uuid>;

    fn kind() -> ModelKind {
        ModelKind::of::<Self>()
    }
}

/// Explicit type token for a model type
///
/// Two kinds are equal only when they were created for the same Rust type;
/// two different types sharing a `NAME` are still different kinds.
#[derive(Clone, Copy)]
pub struct ModelKind {
    type_id: TypeId,
    name: &'static str,
}

impl ModelKind {
    pub fn of<M: Model>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            name: M::NAME,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Key of this model inside a component context
    pub fn context_key(&self) -> String {
        self.name.to_lowercase()
    }
}

impl PartialEq for ModelKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ModelKind {}

impl Hash for ModelKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelKind({})", self.name)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Type-erased model instance
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: ModelKind,
    pub id: Option<Uuid>,
    pub data: serde_json::Value,
}

impl Record {
    pub fn from_model<M: Model>(model: &M) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: M::kind(),
            id: model.id(),
            data: serde_json::to_value(model)?,
        })
    }

    pub fn is<M: Model>(&self) -> bool {
        self.kind == M::kind()
    }

    /// Decode back into the concrete model type
    pub fn decode<M: Model>(&self) -> Option<M> {
        if !self.is::<M>() {
            return None;
        }
        serde_json::from_value(self.data.clone()).ok()
    }
}
