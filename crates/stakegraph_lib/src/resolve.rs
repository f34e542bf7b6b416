//! Create-or-load accessors for records that can be referenced before any
//! event explicitly creates them.
//!
//! Every `create_or_load_*` function returns the current record if there is
//! one, without staging a write. Otherwise it builds a record with zero
//! aggregates, stages it and returns it. Calling one twice is the same as
//! calling it once.

use stakegraph_store::models::{
    DelegatedStake, Delegator, Epoch, GraphAccount, GraphNetwork, Indexer, Pool,
    SubgraphDeployment, GRAPH_NETWORK_ID,
};
use stakegraph_store::{Entity, EntityCache};
use tracing::debug;

use crate::ids::{delegated_stake_id, epoch_at, epoch_id};
use crate::ProcessingError;

/// Reads a record through the cache.
pub async fn get<E: Entity>(
    cache: &mut EntityCache<'_>,
    id: &str,
) -> Result<Option<E>, ProcessingError> {
    cache.get::<E>(id).await.map_err(ProcessingError::Store)
}

/// Reads a record that must exist.
pub async fn load<E: Entity>(cache: &mut EntityCache<'_>, id: &str) -> Result<E, ProcessingError> {
    get::<E>(cache, id)
        .await?
        .ok_or_else(|| ProcessingError::missing(E::KIND, id))
}

pub fn save<E: Entity>(cache: &mut EntityCache<'_>, entity: &E) -> Result<(), ProcessingError> {
    cache.set(entity).map_err(ProcessingError::Store)
}

pub async fn load_network(cache: &mut EntityCache<'_>) -> Result<GraphNetwork, ProcessingError> {
    load::<GraphNetwork>(cache, GRAPH_NETWORK_ID).await
}

async fn create_or_load<E, F>(
    cache: &mut EntityCache<'_>,
    id: &str,
    create: F,
) -> Result<E, ProcessingError>
where
    E: Entity,
    F: FnOnce() -> E,
{
    if let Some(existing) = get::<E>(cache, id).await? {
        return Ok(existing);
    }

    debug!(kind = %E::KIND, id, "Creating entity");
    let created = create();
    save(cache, &created)?;
    Ok(created)
}

pub async fn create_or_load_graph_account(
    cache: &mut EntityCache<'_>,
    id: &str,
    created_at: u64,
) -> Result<GraphAccount, ProcessingError> {
    create_or_load(cache, id, || GraphAccount::new(id, created_at)).await
}

/// Also makes sure the indexer's [`GraphAccount`] exists.
pub async fn create_or_load_indexer(
    cache: &mut EntityCache<'_>,
    id: &str,
    created_at: u64,
) -> Result<Indexer, ProcessingError> {
    create_or_load_graph_account(cache, id, created_at).await?;
    create_or_load(cache, id, || Indexer::new(id, created_at)).await
}

/// Also makes sure the delegator's [`GraphAccount`] exists.
pub async fn create_or_load_delegator(
    cache: &mut EntityCache<'_>,
    id: &str,
    created_at: u64,
) -> Result<Delegator, ProcessingError> {
    create_or_load_graph_account(cache, id, created_at).await?;
    create_or_load(cache, id, || Delegator::new(id, created_at)).await
}

pub async fn create_or_load_delegated_stake(
    cache: &mut EntityCache<'_>,
    delegator: &str,
    indexer: &str,
    created_at: u64,
) -> Result<DelegatedStake, ProcessingError> {
    let id = delegated_stake_id(delegator, indexer);
    create_or_load(cache, &id, || DelegatedStake {
        id: id.clone(),
        delegator: delegator.to_string(),
        indexer: indexer.to_string(),
        created_at,
        ..Default::default()
    })
    .await
}

pub async fn create_or_load_subgraph_deployment(
    cache: &mut EntityCache<'_>,
    id: &str,
    created_at: u64,
) -> Result<SubgraphDeployment, ProcessingError> {
    create_or_load(cache, id, || SubgraphDeployment::new(id, created_at)).await
}

pub async fn create_or_load_pool(
    cache: &mut EntityCache<'_>,
    epoch: u64,
) -> Result<Pool, ProcessingError> {
    let id = epoch_id(epoch);
    create_or_load(cache, &id, || Pool::new(id.clone())).await
}

/// The epoch `block` falls into. Reaching an epoch past the network's
/// current one moves the network's epoch anchor forward, so the network
/// record must be saved before calling this and reloaded after.
pub async fn create_or_load_epoch(
    cache: &mut EntityCache<'_>,
    block: u64,
) -> Result<Epoch, ProcessingError> {
    let mut network = load_network(cache).await?;
    let position = epoch_at(&network, block);

    if position.number > network.current_epoch {
        debug!(
            from = network.current_epoch,
            to = position.number,
            "Advancing current epoch"
        );
        network.current_epoch = position.number;
        network.last_length_update_block = position.start_block;
        save(cache, &network)?;
    }

    let id = epoch_id(position.number);
    create_or_load(cache, &id, || Epoch {
        id: id.clone(),
        start_block: position.start_block,
        end_block: position.end_block,
        ..Default::default()
    })
    .await
}

#[cfg(test)]
mod tests {
    use stakegraph_common_types::Address;
    use stakegraph_store::{EntityKind, EntityStore, InMemoryStore};

    use super::*;

    async fn store_with_network() -> InMemoryStore {
        let store = InMemoryStore::new();
        let mut cache = EntityCache::new(&store);
        save(&mut cache, &GraphNetwork::new(Address::default(), 10, 100, 2)).unwrap();
        store.commit(cache.into_batch(None)).await.unwrap();
        store
    }

    #[tokio::test]
    async fn existing_records_are_returned_unchanged() {
        let store = InMemoryStore::new();
        let mut cache = EntityCache::new(&store);

        let mut indexer = create_or_load_indexer(&mut cache, "0xa1", 7).await.unwrap();
        indexer.forced_settlements = 2;
        save(&mut cache, &indexer).unwrap();
        store.commit(cache.into_batch(None)).await.unwrap();

        let mut cache = EntityCache::new(&store);
        let again = create_or_load_indexer(&mut cache, "0xa1", 99).await.unwrap();
        assert_eq!(again, indexer);
        assert_eq!(again.created_at, 7);
        assert_eq!(cache.written_keys().count(), 0);
    }

    #[tokio::test]
    async fn indexers_and_delegators_come_with_an_account() {
        let store = InMemoryStore::new();
        let mut cache = EntityCache::new(&store);
        create_or_load_indexer(&mut cache, "0xa1", 7).await.unwrap();
        create_or_load_delegator(&mut cache, "0xd1", 7).await.unwrap();
        store.commit(cache.into_batch(None)).await.unwrap();

        assert_eq!(store.count(EntityKind::GraphAccount).await, 2);
        assert_eq!(store.count(EntityKind::Indexer).await, 1);
        assert_eq!(store.count(EntityKind::Delegator).await, 1);
    }

    #[tokio::test]
    async fn missing_required_record() {
        let store = InMemoryStore::new();
        let mut cache = EntityCache::new(&store);
        let err = load::<Indexer>(&mut cache, "0xa1").await.unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::MissingEntity { kind: EntityKind::Indexer, ref id } if id == "0xa1"
        ));
    }

    #[tokio::test]
    async fn epochs_advance_the_network() {
        let store = store_with_network().await;
        let mut cache = EntityCache::new(&store);

        let epoch = create_or_load_epoch(&mut cache, 135).await.unwrap();
        assert_eq!(epoch.id, "5");
        assert_eq!((epoch.start_block, epoch.end_block), (130, 139));

        let network = load_network(&mut cache).await.unwrap();
        assert_eq!(network.current_epoch, 5);
        assert_eq!(network.last_length_update_block, 130);

        // Older blocks don't rewind anything.
        let epoch = create_or_load_epoch(&mut cache, 101).await.unwrap();
        assert_eq!(epoch.id, "5");
    }

    #[tokio::test]
    async fn delegated_stake_ids_are_composite() {
        let store = InMemoryStore::new();
        let mut cache = EntityCache::new(&store);
        let stake = create_or_load_delegated_stake(&mut cache, "0xd1", "0xa1", 3)
            .await
            .unwrap();
        assert_eq!(stake.id, "0xd1-0xa1");
        assert_eq!(stake.delegator, "0xd1");
        assert_eq!(stake.indexer, "0xa1");
        assert!(stake.staked_tokens.is_zero());
    }
}
