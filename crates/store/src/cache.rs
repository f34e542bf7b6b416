//! A read-through cache that collects the writes of a single event.
//!
//! Handlers never talk to the [`EntityStore`] directly. They read and write
//! through an [`EntityCache`], which sees its own writes immediately and
//! turns them into one [`WriteBatch`] at the end. Dropping the cache without
//! committing discards every write, which is how a failed event leaves the
//! store untouched.

use std::collections::{BTreeMap, HashMap};

use anyhow::Context;
use stakegraph_common_types::EventPointer;

use crate::{Entity, EntityKey, EntityStore, WriteBatch};

pub struct EntityCache<'a> {
    store: &'a dyn EntityStore,
    /// What the store returned, including misses.
    reads: HashMap<EntityKey, Option<serde_json::Value>>,
    writes: BTreeMap<EntityKey, serde_json::Value>,
}

impl<'a> EntityCache<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self {
            store,
            reads: HashMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Returns the latest version of the record, written or stored.
    pub async fn get<E: Entity>(&mut self, id: &str) -> anyhow::Result<Option<E>> {
        let key = EntityKey::new(E::KIND, id);

        let value = if let Some(written) = self.writes.get(&key) {
            Some(written.clone())
        } else if let Some(read) = self.reads.get(&key) {
            read.clone()
        } else {
            let stored = self.store.get(&key).await?;
            self.reads.insert(key.clone(), stored.clone());
            stored
        };

        value
            .map(|value| {
                serde_json::from_value::<E>(value)
                    .with_context(|| format!("malformed record for {}", key))
            })
            .transpose()
    }

    /// Stages the full current state of `entity`, replacing any earlier
    /// staged version.
    pub fn set<E: Entity>(&mut self, entity: &E) -> anyhow::Result<()> {
        let value = serde_json::to_value(entity)
            .with_context(|| format!("failed to serialize {}", entity.key()))?;
        self.writes.insert(entity.key(), value);
        Ok(())
    }

    /// Keys staged so far, in key order.
    pub fn written_keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.writes.keys()
    }

    pub fn into_batch(self, cursor: Option<EventPointer>) -> WriteBatch {
        WriteBatch {
            entities: self.writes,
            cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Indexer;
    use crate::{get_entity, EntityKind, InMemoryStore};

    #[tokio::test]
    async fn reads_its_own_writes() {
        let store = InMemoryStore::new();
        let mut cache = EntityCache::new(&store);

        assert_eq!(cache.get::<Indexer>("0xa1").await.unwrap(), None);

        let indexer = Indexer::new("0xa1", 7);
        cache.set(&indexer).unwrap();
        assert_eq!(cache.get::<Indexer>("0xa1").await.unwrap(), Some(indexer));
    }

    #[tokio::test]
    async fn nothing_lands_until_committed() {
        let store = InMemoryStore::new();
        let mut cache = EntityCache::new(&store);
        cache.set(&Indexer::new("0xa1", 7)).unwrap();

        assert!(get_entity::<Indexer, _>(&store, "0xa1")
            .await
            .unwrap()
            .is_none());

        let batch = cache.into_batch(None);
        store.commit(batch).await.unwrap();
        assert!(get_entity::<Indexer, _>(&store, "0xa1")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn dropped_cache_writes_nothing() {
        let store = InMemoryStore::new();
        {
            let mut cache = EntityCache::new(&store);
            cache.set(&Indexer::new("0xa1", 7)).unwrap();
        }
        assert_eq!(store.count(EntityKind::Indexer).await, 0);
    }

    #[tokio::test]
    async fn later_writes_replace_earlier_ones() {
        let store = InMemoryStore::new();
        let mut cache = EntityCache::new(&store);

        let mut indexer = Indexer::new("0xa1", 7);
        cache.set(&indexer).unwrap();
        indexer.forced_settlements = 3;
        cache.set(&indexer).unwrap();

        let batch = cache.into_batch(None);
        assert_eq!(batch.entities.len(), 1);
        let stored = batch.entities.values().next().unwrap();
        assert_eq!(stored["forcedSettlements"], 3);
    }
}
