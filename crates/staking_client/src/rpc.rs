use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use ethers::abi::Detokenize;
use ethers::contract::{abigen, ContractCall};
use ethers::providers::{Http, Provider};
use ethers::types::{Address as EthAddress, U256};
use prometheus::IntCounterVec;
use stakegraph_common_types::{Address, BigInt};
use tracing::{debug, warn};
use url::Url;

use crate::{IndexerStakes, StakingContract, StakingParameter};

// Every getter is declared as `uint256`; the narrower integer types the
// contract actually returns decode the same way.
abigen!(
    StakingBinding,
    r#"[
        function stakes(address indexer) external view returns (uint256, uint256, uint256, uint256)
        function thawingPeriod() external view returns (uint256)
        function curationPercentage() external view returns (uint256)
        function protocolPercentage() external view returns (uint256)
        function channelDisputeEpochs() external view returns (uint256)
        function maxAllocationEpochs() external view returns (uint256)
        function delegationRatio() external view returns (uint256)
        function delegationParametersCooldown() external view returns (uint256)
        function delegationUnbondingPeriod() external view returns (uint256)
    ]"#
);

type Staking = StakingBinding<Provider<Http>>;

/// A [`StakingContract`] that reads through `eth_call` on an Ethereum node.
#[derive(Debug, Clone)]
pub struct RpcStakingContract {
    provider: Arc<Provider<Http>>,
    // Metrics
    // -------
    contract_calls: IntCounterVec,
}

impl RpcStakingContract {
    /// `timeout` applies to each JSON-RPC request.
    pub fn new(
        endpoint: Url,
        timeout: Duration,
        contract_calls: IntCounterVec,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let provider = Provider::new(Http::new_with_client(endpoint, client));

        Ok(Self {
            provider: Arc::new(provider),
            contract_calls,
        })
    }

    fn binding(&self, contract: &Address) -> Staking {
        StakingBinding::new(EthAddress::from(contract.0), self.provider.clone())
    }

    async fn call<D>(
        &self,
        name: &'static str,
        contract: &Address,
        call: ContractCall<Provider<Http>, D>,
        block: u64,
    ) -> anyhow::Result<D>
    where
        D: Detokenize + Send + Sync,
    {
        debug!(call = name, block, "Calling staking contract");
        let result = call.block(block).call().await;

        let success = result.is_ok().to_string();
        self.contract_calls
            .with_label_values(&[name, success.as_str()])
            .inc();

        if let Err(err) = &result {
            warn!(
                err = %err,
                call = name,
                block,
                contract = %contract,
                "Staking contract call failed"
            );
        }
        result.with_context(|| format!("{} at block {}", name, block))
    }
}

#[async_trait]
impl StakingContract for RpcStakingContract {
    async fn stakes(
        &self,
        contract: &Address,
        indexer: &Address,
        block: u64,
    ) -> anyhow::Result<IndexerStakes> {
        let call = self.binding(contract).stakes(EthAddress::from(indexer.0));
        let words = self.call("stakes", contract, call, block).await?;
        Ok(stakes_from_words(words))
    }

    async fn parameter(
        &self,
        contract: &Address,
        parameter: StakingParameter,
        block: u64,
    ) -> anyhow::Result<BigInt> {
        let (name, call) = parameter
            .getter()
            .zip(parameter_call(&self.binding(contract), parameter))
            .ok_or_else(|| anyhow!("parameter {} is not numeric", parameter))?;
        let value = self.call(name, contract, call, block).await?;
        Ok(to_big_int(value))
    }
}

fn parameter_call(
    staking: &Staking,
    parameter: StakingParameter,
) -> Option<ContractCall<Provider<Http>, U256>> {
    let call = match parameter {
        StakingParameter::Curation => return None,
        StakingParameter::ThawingPeriod => staking.thawing_period(),
        StakingParameter::CurationPercentage => staking.curation_percentage(),
        StakingParameter::ProtocolPercentage => staking.protocol_percentage(),
        StakingParameter::ChannelDisputeEpochs => staking.channel_dispute_epochs(),
        StakingParameter::MaxAllocationEpochs => staking.max_allocation_epochs(),
        StakingParameter::DelegationCapacity => staking.delegation_ratio(),
        StakingParameter::DelegationParametersCooldown => {
            staking.delegation_parameters_cooldown()
        }
        StakingParameter::DelegationUnbondingPeriod => staking.delegation_unbonding_period(),
    };
    Some(call)
}

/// `stakes(address)` returns the `Stakes.Indexer` struct in declaration
/// order.
fn stakes_from_words(words: (U256, U256, U256, U256)) -> IndexerStakes {
    let (staked, allocated, locked, locked_until) = words;
    IndexerStakes {
        tokens_staked: to_big_int(staked),
        tokens_allocated: to_big_int(allocated),
        tokens_locked: to_big_int(locked),
        tokens_locked_until: to_big_int(locked_until),
    }
}

fn to_big_int(value: U256) -> BigInt {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    BigInt::from_unsigned_bytes_be(&word)
}
