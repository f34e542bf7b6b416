use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use stakegraph_common_types::{Address, BigInt};
use stakegraph_staking_client::{IndexerStakes, StakingContract, StakingParameter};

/// A [`StakingContract`] that answers from canned values.
#[derive(Debug, Default)]
pub struct MockStakingContract {
    pub stakes: HashMap<Address, IndexerStakes>,
    pub parameters: HashMap<StakingParameter, BigInt>,
    /// Makes every call fail.
    pub fail: bool,
    calls: AtomicUsize,
}

impl MockStakingContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_stakes(mut self, indexer: Address, stakes: IndexerStakes) -> Self {
        self.stakes.insert(indexer, stakes);
        self
    }

    pub fn with_parameter(mut self, parameter: StakingParameter, value: impl Into<BigInt>) -> Self {
        self.parameters.insert(parameter, value.into());
        self
    }

    /// Number of calls made so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(anyhow!("mock staking contract is failing"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StakingContract for MockStakingContract {
    async fn stakes(
        &self,
        _contract: &Address,
        indexer: &Address,
        _block: u64,
    ) -> anyhow::Result<IndexerStakes> {
        self.record_call()?;
        Ok(self.stakes.get(indexer).cloned().unwrap_or_default())
    }

    async fn parameter(
        &self,
        _contract: &Address,
        parameter: StakingParameter,
        _block: u64,
    ) -> anyhow::Result<BigInt> {
        self.record_call()?;
        self.parameters
            .get(&parameter)
            .cloned()
            .ok_or_else(|| anyhow!("no value for {}", parameter))
    }
}
