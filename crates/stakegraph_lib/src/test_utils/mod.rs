pub mod events;
pub mod gen;
pub mod mocks;

use std::env;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rand::rngs::{OsRng, SmallRng};
use rand::{RngCore, SeedableRng};
use stakegraph_common_types::{Address, BigInt, Block, BlockHash, Bytes32};
use stakegraph_store::models::{GraphNetwork, GRAPH_NETWORK_ID};
use stakegraph_store::{get_entity, Entity, InMemoryStore};

use self::mocks::MockStakingContract;
use crate::config::EpochsConfig;
use crate::network::initialize_network;
use crate::{metrics, EventProcessor, Outcome, ProcessingError, StakingEvent};

pub static TEST_SEED: Lazy<u64> = Lazy::new(|| {
    let seed = env::var("TEST_SEED")
        .map(|seed| seed.parse().expect("Invalid TEST_SEED value"))
        .unwrap_or(OsRng.next_u64());

    println!("------------------------------------------------------------------------");
    println!("TEST_SEED={}", seed);
    println!("  This value can be changed via the environment variable TEST_SEED.");
    println!("------------------------------------------------------------------------");

    seed
});

pub fn fast_rng(seed_extra: u64) -> SmallRng {
    SmallRng::seed_from_u64(*TEST_SEED + seed_extra)
}

/// Blocks per epoch on the test network.
pub const EPOCH_LENGTH: u64 = 100;

/// A deterministic address whose last bytes are `n`.
pub fn address(n: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[12..].copy_from_slice(&n.to_be_bytes());
    Address::from(bytes)
}

/// A deterministic 32-byte id, for deployments and PoIs.
pub fn bytes32(n: u64) -> Bytes32 {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&n.to_be_bytes());
    Bytes32::from(bytes)
}

pub fn tokens(n: u64) -> BigInt {
    BigInt::from(n)
}

/// Block `number`, twelve seconds apart.
pub fn block(number: u64) -> Block {
    Block {
        number,
        hash: BlockHash::from(number.to_be_bytes().to_vec()),
        timestamp: 1_600_000_000 + number * 12,
    }
}

/// An in-memory store with an initialized network and a processor on top
/// of it.
pub struct TestHarness {
    pub store: Arc<InMemoryStore>,
    pub contract: Arc<MockStakingContract>,
    pub processor: EventProcessor,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_contract(MockStakingContract::new()).await
    }

    pub async fn with_contract(contract: MockStakingContract) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let contract = Arc::new(contract);
        let epochs = EpochsConfig {
            length: EPOCH_LENGTH,
            start_block: 0,
            start_epoch: 0,
        };
        initialize_network(store.as_ref(), address(0xfeed), &epochs)
            .await
            .unwrap();
        let processor = EventProcessor::new(store.clone(), contract.clone(), metrics())
            .await
            .unwrap();

        Self {
            store,
            contract,
            processor,
        }
    }

    pub async fn try_apply(&mut self, event: &StakingEvent) -> Result<Outcome, ProcessingError> {
        self.processor.process(event).await
    }

    /// Applies all events, panicking on the first failure.
    pub async fn apply_all(&mut self, events: &[StakingEvent]) {
        for event in events {
            self.try_apply(event)
                .await
                .unwrap_or_else(|e| panic!("failed to apply {:?}: {}", event, e));
        }
    }

    pub async fn get<E: Entity>(&self, id: &str) -> Option<E> {
        get_entity::<E, _>(self.store.as_ref(), id).await.unwrap()
    }

    /// Like [`TestHarness::get`], for records that must exist.
    pub async fn load<E: Entity>(&self, id: &str) -> E {
        self.get::<E>(id)
            .await
            .unwrap_or_else(|| panic!("{} {} does not exist", E::KIND, id))
    }

    pub async fn network(&self) -> GraphNetwork {
        self.load::<GraphNetwork>(GRAPH_NETWORK_ID).await
    }
}
