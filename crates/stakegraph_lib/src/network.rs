use anyhow::ensure;
use stakegraph_common_types::Address;
use stakegraph_store::models::{GraphNetwork, GRAPH_NETWORK_ID};
use stakegraph_store::{get_entity, Entity, EntityStore, WriteBatch};
use tracing::info;

use crate::config::EpochsConfig;

/// Makes sure the [`GraphNetwork`] singleton exists before the first event
/// is processed. An existing network is returned as is, so this is safe to
/// call on every start.
pub async fn initialize_network(
    store: &dyn EntityStore,
    staking: Address,
    epochs: &EpochsConfig,
) -> anyhow::Result<GraphNetwork> {
    if let Some(network) = get_entity::<GraphNetwork, _>(store, GRAPH_NETWORK_ID).await? {
        info!(
            current_epoch = network.current_epoch,
            staking = %network.staking,
            "Graph network already initialized"
        );
        return Ok(network);
    }

    ensure!(epochs.length > 0, "epoch length must be positive");
    ensure!(!staking.is_zero(), "staking contract address must not be zero");

    let network = GraphNetwork::new(staking, epochs.length, epochs.start_block, epochs.start_epoch);
    let mut batch = WriteBatch::default();
    batch
        .entities
        .insert(network.key(), serde_json::to_value(&network)?);
    store.commit(batch).await?;

    info!(
        staking = %staking,
        epoch_length = epochs.length,
        start_epoch = epochs.start_epoch,
        "Initialized graph network"
    );
    Ok(network)
}

#[cfg(test)]
mod tests {
    use stakegraph_store::InMemoryStore;

    use super::*;

    fn epochs() -> EpochsConfig {
        EpochsConfig {
            length: 100,
            start_block: 1000,
            start_epoch: 3,
        }
    }

    #[tokio::test]
    async fn initializes_once() {
        let store = InMemoryStore::new();
        let staking: Address = "0xf55041e37e12cd407ad00ce2910b8269b01263b9"
            .parse()
            .unwrap();

        let network = initialize_network(&store, staking, &epochs()).await.unwrap();
        assert_eq!(network.id, GRAPH_NETWORK_ID);
        assert_eq!(network.current_epoch, 3);
        assert_eq!(network.last_length_update_block, 1000);
        assert!(network.total_tokens_staked.is_zero());

        let other = EpochsConfig {
            length: 5,
            ..epochs()
        };
        let again = initialize_network(&store, Address::default(), &other).await.unwrap();
        assert_eq!(again, network);
        // Initializing doesn't count as applying an event.
        assert_eq!(store.cursor().await.unwrap(), None);
    }

    #[tokio::test]
    async fn zero_epoch_length_is_rejected() {
        let store = InMemoryStore::new();
        let staking: Address = "0xf55041e37e12cd407ad00ce2910b8269b01263b9"
            .parse()
            .unwrap();
        let epochs = EpochsConfig {
            length: 0,
            ..epochs()
        };
        let err = initialize_network(&store, staking, &epochs)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("epoch length"));
    }

    #[tokio::test]
    async fn null_staking_address_is_rejected() {
        let store = InMemoryStore::new();
        let err = initialize_network(&store, Address::default(), &epochs())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("staking contract"));
        assert!(get_entity::<GraphNetwork, _>(&store, GRAPH_NETWORK_ID)
            .await
            .unwrap()
            .is_none());
    }
}
