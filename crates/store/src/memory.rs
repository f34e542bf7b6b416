use std::collections::HashMap;

use async_trait::async_trait;
use stakegraph_common_types::EventPointer;
use tokio::sync::RwLock;

use crate::{EntityKey, EntityKind, EntityStore, WriteBatch};

#[derive(Debug, Default)]
struct Inner {
    entities: HashMap<EntityKey, serde_json::Value>,
    cursor: Option<EventPointer>,
}

/// An [`EntityStore`] that keeps everything in memory. A batch is applied
/// under a single write lock, so readers never see half of it.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records of the given kind.
    pub async fn count(&self, kind: EntityKind) -> usize {
        self.inner
            .read()
            .await
            .entities
            .keys()
            .filter(|key| key.kind == kind)
            .count()
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn get(&self, key: &EntityKey) -> anyhow::Result<Option<serde_json::Value>> {
        Ok(self.inner.read().await.entities.get(key).cloned())
    }

    async fn commit(&self, batch: WriteBatch) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        inner.entities.extend(batch.entities);
        if let Some(cursor) = batch.cursor {
            inner.cursor = Some(cursor);
        }
        Ok(())
    }

    async fn cursor(&self) -> anyhow::Result<Option<EventPointer>> {
        Ok(self.inner.read().await.cursor)
    }
}
