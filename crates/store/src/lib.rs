//! Entity storage for stakegraph.
//!
//! The store is a plain key-value map from `(entity kind, id)` to the full
//! JSON document of a record. Writers never update single fields: every
//! write replaces the whole record, and all the writes caused by one event
//! are committed together as a [`WriteBatch`].

pub mod cache;
mod memory;
pub mod models;
mod postgres;
mod schema;

use std::collections::BTreeMap;

use async_trait::async_trait;
pub use cache::EntityCache;
pub use memory::InMemoryStore;
pub use postgres::PgStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use stakegraph_common_types::EventPointer;

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    // strum is used for (de)serialization in the database.
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum EntityKind {
    GraphAccount,
    GraphNetwork,
    Indexer,
    Delegator,
    DelegatedStake,
    Allocation,
    SubgraphDeployment,
    Pool,
    Epoch,
}

/// Uniquely identifies a stored record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind, self.id)
    }
}

/// A typed record that can live in an [`EntityStore`].
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn key(&self) -> EntityKey {
        EntityKey::new(Self::KIND, self.id())
    }
}

/// Everything one event wrote, applied all-or-nothing.
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    /// Full current state of every written record.
    pub entities: BTreeMap<EntityKey, serde_json::Value>,
    /// Position of the event that produced this batch. Committed in the same
    /// transaction as the entities.
    pub cursor: Option<EventPointer>,
}

impl WriteBatch {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.cursor.is_none()
    }
}

/// A durable key-value store with point reads and atomic batch writes.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Returns the stored document for `key`, if any.
    async fn get(&self, key: &EntityKey) -> anyhow::Result<Option<serde_json::Value>>;

    /// Persists every record in `batch`, replacing prior versions, and moves
    /// the cursor. Either all of it lands or none of it does.
    async fn commit(&self, batch: WriteBatch) -> anyhow::Result<()>;

    /// The position of the last committed event.
    async fn cursor(&self) -> anyhow::Result<Option<EventPointer>>;
}

/// Typed point read, for consumers and tests that don't need a cache.
pub async fn get_entity<E, S>(store: &S, id: &str) -> anyhow::Result<Option<E>>
where
    E: Entity,
    S: EntityStore + ?Sized,
{
    store
        .get(&EntityKey::new(E::KIND, id))
        .await?
        .map(serde_json::from_value::<E>)
        .transpose()
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn entity_kind_text_roundtrip() {
        for kind in [
            EntityKind::GraphAccount,
            EntityKind::DelegatedStake,
            EntityKind::SubgraphDeployment,
        ] {
            assert_eq!(EntityKind::from_str(kind.as_ref()).unwrap(), kind);
        }
        assert_eq!(EntityKind::Pool.to_string(), "Pool");
    }

    #[test]
    fn entity_key_display() {
        let key = EntityKey::new(EntityKind::Indexer, "0xa1");
        assert_eq!(key.to_string(), "Indexer(0xa1)");
    }
}
