/// SQLite document store
///
/// Every model record is stored as a JSON document keyed by
/// `(model name, id)`. Hooks registered through `Store::on_mutation` run after
/// an update has been written, in registration order, and are awaited by the
/// updating caller.
use super::{MutationHandler, Store};
use crate::errors::StoreError;
use crate::logger::{self, LogTag};
use crate::models::{Model, ModelKind, Record};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

/// Special path that opens a process-local database
pub const MEMORY_PATH: &str = ":memory:";

pub struct SqliteStore {
    conn: Mutex<Connection>,
    hooks: RwLock<HashMap<ModelKind, Vec<MutationHandler>>>,
    database_path: String,
}

impl SqliteStore {
    /// Open (or create) the database at `path`; `":memory:"` stays in memory
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = if path == MEMORY_PATH {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Connection::open(path)?
        };

        let store = Self {
            conn: Mutex::new(conn),
            hooks: RwLock::new(HashMap::new()),
            database_path: path.to_string(),
        };
        store.initialize_schema()?;

        logger::info(
            LogTag::Store,
            &format!("Record store initialized at {}", store.database_path),
        );

        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(MEMORY_PATH)
    }

    pub fn database_path(&self) -> &str {
        &self.database_path
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();

        if self.database_path != MEMORY_PATH {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
        }

        conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                model       TEXT NOT NULL,
                id          TEXT NOT NULL,
                body        TEXT NOT NULL,
                updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (model, id)
            )",
            [],
        )?;

        Ok(())
    }

    /// Insert a new record; does not fire mutation hooks
    pub fn create<M: Model>(&self, model: &M) -> Result<Uuid, StoreError> {
        let id = model.id().ok_or(StoreError::MissingId { model: M::NAME })?;
        let body = serde_json::to_string(model)?;

        self.conn.lock().execute(
            "INSERT INTO records (model, id, body) VALUES (?1, ?2, ?3)",
            params![M::NAME, id.to_string(), body],
        )?;

        logger::debug(LogTag::Store, &format!("Created {} {}", M::NAME, id));
        Ok(id)
    }

    /// Overwrite an existing record, then run the hooks for its kind
    pub async fn update<M: Model>(&self, model: &M) -> Result<(), StoreError> {
        let record = Record::from_model(model)?;
        let id = record.id.ok_or(StoreError::MissingId { model: M::NAME })?;

        let changed = self.conn.lock().execute(
            "UPDATE records SET body = ?3, updated_at = datetime('now')
             WHERE model = ?1 AND id = ?2",
            params![M::NAME, id.to_string(), record.data.to_string()],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound { model: M::NAME, id });
        }

        logger::debug(LogTag::Store, &format!("Updated {} {}", M::NAME, id));
        self.notify(record).await;
        Ok(())
    }

    /// Create or update; hooks fire only when an existing row was updated
    pub async fn save<M: Model>(&self, model: &M) -> Result<(), StoreError> {
        let id = model.id().ok_or(StoreError::MissingId { model: M::NAME })?;
        if self.exists(M::NAME, id)? {
            self.update(model).await
        } else {
            self.create(model).map(|_| ())
        }
    }

    /// Delete a record; returns whether a row was removed
    pub fn delete<M: Model>(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self.conn.lock().execute(
            "DELETE FROM records WHERE model = ?1 AND id = ?2",
            params![M::NAME, id.to_string()],
        )?;
        Ok(removed > 0)
    }

    /// Typed lookup
    pub fn find<M: Model>(&self, id: Uuid) -> Result<Option<M>, StoreError> {
        match self.load_one(M::NAME, id)? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// Number of hooks registered for `kind`
    pub fn hook_count(&self, kind: &ModelKind) -> usize {
        self.hooks.read().get(kind).map_or(0, Vec::len)
    }

    /// Drop every record
    ///
    /// Hooks stay registered: observers installed once keep seeing updates
    /// made after the reset.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.conn.lock().execute("DELETE FROM records", [])?;
        Ok(())
    }

    fn exists(&self, model: &str, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.load_one(model, id)?.is_some())
    }

    fn load_one(&self, model: &str, id: Uuid) -> Result<Option<String>, StoreError> {
        let body = self
            .conn
            .lock()
            .query_row(
                "SELECT body FROM records WHERE model = ?1 AND id = ?2",
                params![model, id.to_string()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(body)
    }

    async fn notify(&self, record: Record) {
        // Clone the handler list so the hooks lock is not held while awaiting
        let handlers: Vec<MutationHandler> = self
            .hooks
            .read()
            .get(&record.kind)
            .cloned()
            .unwrap_or_default();

        logger::verbose(
            LogTag::Store,
            &format!(
                "Running {} mutation hook(s) for {}",
                handlers.len(),
                record.kind
            ),
        );

        for handler in handlers {
            handler(record.clone()).await;
        }
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn fetch_one(&self, kind: &ModelKind, id: Uuid) -> Result<Option<Record>, StoreError> {
        match self.load_one(kind.name(), id)? {
            Some(body) => Ok(Some(Record {
                kind: *kind,
                id: Some(id),
                data: serde_json::from_str(&body)?,
            })),
            None => Ok(None),
        }
    }

    async fn fetch_all(&self, kind: &ModelKind) -> Result<Vec<Record>, StoreError> {
        let rows: Vec<(String, String)> = {
            let conn = self.conn.lock();
            let mut stmt =
                conn.prepare("SELECT id, body FROM records WHERE model = ?1 ORDER BY rowid")?;
            let rows = stmt
                .query_map(params![kind.name()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        rows.into_iter()
            .map(|(id, body)| {
                let id = Uuid::parse_str(&id).map_err(|_| StoreError::InvalidId(id.clone()))?;
                Ok(Record {
                    kind: *kind,
                    id: Some(id),
                    data: serde_json::from_str(&body)?,
                })
            })
            .collect()
    }

    fn on_mutation(&self, kind: ModelKind, handler: MutationHandler) {
        self.hooks.write().entry(kind).or_default().push(handler);
        logger::debug(LogTag::Store, &format!("Mutation hook installed for {}", kind));
    }
}
