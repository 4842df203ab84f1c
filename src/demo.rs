/// Demo mode
///
/// Seeds a few `Header`/`Detail` pairs, registers the `Row` component that
/// renders them and keeps touching the headers so connected pages see live
/// updates.
///
/// Enable with: cargo run -- --demo
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::components::Component;
use crate::engine::Mist;
use crate::errors::StoreError;
use crate::logger::{self, LogTag};
use crate::models::{Model, ModelKind};
use crate::store::SqliteStore;

/// Number of rows seeded at startup
pub const DEMO_ROWS: usize = 3;

/// Interval between demo updates
pub const DEMO_TICK: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub id: Option<Uuid>,
    pub text: String,
}

impl Model for Header {
    const NAME: &'static str = "Header";

    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detail {
    pub id: Option<Uuid>,
    pub text2: String,
}

impl Model for Detail {
    const NAME: &'static str = "Detail";

    fn id(&self) -> Option<Uuid> {
        self.id
    }
}

/// Table row joining a header and its detail; rendered from `templates/Row.html`
pub struct Row;

impl Component for Row {
    fn models(&self) -> Vec<ModelKind> {
        vec![Header::kind(), Detail::kind()]
    }
}

/// Create the demo rows, returning their ids
pub fn seed(store: &SqliteStore) -> Result<Vec<Uuid>, StoreError> {
    let mut ids = Vec::with_capacity(DEMO_ROWS);
    for n in 1..=DEMO_ROWS {
        let id = Uuid::new_v4();
        store.create(&Header {
            id: Some(id),
            text: format!("Row {}", n),
        })?;
        store.create(&Detail {
            id: Some(id),
            text2: "waiting for first update".to_string(),
        })?;
        ids.push(id);
    }
    logger::info(
        LogTag::Demo,
        &format!("Seeded {} demo rows", ids.len()),
    );
    Ok(ids)
}

/// Apply update number `tick` to one of the rows
pub async fn tick(store: &SqliteStore, ids: &[Uuid], tick: u64) -> Result<(), StoreError> {
    if ids.is_empty() {
        return Ok(());
    }
    let index = (tick as usize) % ids.len();
    let id = ids[index];

    store
        .update(&Header {
            id: Some(id),
            text: format!("Row {} (update #{})", index + 1, tick),
        })
        .await?;
    store
        .update(&Detail {
            id: Some(id),
            text2: format!("changed at {}", chrono::Local::now().format("%H:%M:%S")),
        })
        .await?;

    logger::debug(
        LogTag::Demo,
        &format!("Demo update #{} applied to row {}", tick, index + 1),
    );
    Ok(())
}

/// Register the demo component, seed data and start the update loop
pub async fn start(mist: &Mist, store: Arc<SqliteStore>) -> Result<JoinHandle<()>, StoreError> {
    mist.register(Row).await;
    let ids = seed(&store)?;

    Ok(tokio::spawn(async move {
        let mut interval = tokio::time::interval(DEMO_TICK);
        let mut count: u64 = 0;
        loop {
            interval.tick().await;
            count += 1;
            if let Err(e) = tick(&store, &ids, count).await {
                logger::error(LogTag::Demo, &format!("Demo update failed: {}", e));
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateRenderer;
    use crate::webserver::ws::Message;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_seed_and_tick() {
        let store = SqliteStore::open_in_memory().unwrap();
        let ids = seed(&store).unwrap();
        assert_eq!(ids.len(), DEMO_ROWS);

        tick(&store, &ids, 4).await.unwrap();
        let header = store.find::<Header>(ids[1]).unwrap().unwrap();
        assert_eq!(header.text, "Row 2 (update #4)");
    }

    #[tokio::test]
    async fn test_ticks_push_rows() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let renderer = TemplateRenderer::new();
        renderer.insert(
            "Row",
            "<tr><td>{{ component.header.text }}</td><td>{{ component.detail.text2 }}</td></tr>",
        );
        let mist = Mist::new(store.clone(), Arc::new(renderer));
        mist.register(Row).await;
        let ids = seed(&store).unwrap();

        let conn = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(8);
        mist.clients().add(conn, tx).await;
        mist.clients().add_subscription("Row", conn).await;

        tick(&store, &ids, 0).await.unwrap();

        let text = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let update = Message::decode(&text).unwrap();
        assert_eq!(update.component(), "Row");
        assert!(text.contains("Row 1 (update #0)"));
    }
}
