//! Typed staking events, as delivered by the upstream log source.
//!
//! Payload field names follow the event parameters of the staking contract.

use serde::{Deserialize, Serialize};
use stakegraph_common_types::{Address, BigInt, Block, Bytes32, EventPointer, PoiBytes};

/// One staking event together with its position in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingEvent {
    pub block: Block,
    /// Position of the log within its block.
    pub log_index: u64,
    pub event: Event,
}

impl StakingEvent {
    pub fn pointer(&self) -> EventPointer {
        EventPointer {
            block_number: self.block.number,
            log_index: self.log_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "kind")]
pub enum Event {
    StakeDeposited(StakeDeposited),
    StakeLocked(StakeLocked),
    StakeWithdrawn(StakeWithdrawn),
    StakeSlashed(StakeSlashed),
    StakeDelegated(StakeDelegated),
    StakeDelegatedLocked(StakeDelegatedLocked),
    StakeDelegatedWithdrawn(StakeDelegatedWithdrawn),
    AllocationCreated(AllocationCreated),
    AllocationCollected(AllocationCollected),
    AllocationClosed(AllocationClosed),
    RebateClaimed(RebateClaimed),
    ParameterUpdated(ParameterUpdated),
    SetOperator(SetOperator),
    DelegationParametersUpdated(DelegationParametersUpdated),
}

impl Event {
    /// The event name, e.g. `"StakeDeposited"`.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeDeposited {
    pub indexer: Address,
    pub tokens: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeLocked {
    pub indexer: Address,
    /// Total locked tokens after this event, not a delta.
    pub tokens: BigInt,
    pub until: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeWithdrawn {
    pub indexer: Address,
    pub tokens: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeSlashed {
    pub indexer: Address,
    pub tokens: BigInt,
    pub reward: BigInt,
    pub beneficiary: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeDelegated {
    pub indexer: Address,
    pub delegator: Address,
    pub tokens: BigInt,
    pub shares: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeDelegatedLocked {
    pub indexer: Address,
    pub delegator: Address,
    pub tokens: BigInt,
    pub shares: BigInt,
    pub until: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeDelegatedWithdrawn {
    pub indexer: Address,
    pub delegator: Address,
    pub tokens: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationCreated {
    pub indexer: Address,
    #[serde(rename = "subgraphDeploymentID")]
    pub subgraph_deployment_id: Bytes32,
    pub epoch: u64,
    pub tokens: BigInt,
    #[serde(rename = "allocationID")]
    pub allocation_id: Address,
    #[serde(default)]
    pub metadata: Bytes32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationCollected {
    pub indexer: Address,
    #[serde(rename = "subgraphDeploymentID")]
    pub subgraph_deployment_id: Bytes32,
    pub epoch: u64,
    pub tokens: BigInt,
    #[serde(rename = "allocationID")]
    pub allocation_id: Address,
    pub from: Address,
    pub curation_fees: BigInt,
    /// Query fees net of curation and protocol fees.
    pub rebate_fees: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationClosed {
    pub indexer: Address,
    #[serde(rename = "subgraphDeploymentID")]
    pub subgraph_deployment_id: Bytes32,
    pub epoch: u64,
    pub tokens: BigInt,
    #[serde(rename = "allocationID")]
    pub allocation_id: Address,
    pub effective_allocation: BigInt,
    /// Whoever closed the allocation. Anyone other than the indexer forces
    /// the settlement.
    pub sender: Address,
    pub poi: PoiBytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebateClaimed {
    pub indexer: Address,
    #[serde(rename = "subgraphDeploymentID")]
    pub subgraph_deployment_id: Bytes32,
    #[serde(rename = "allocationID")]
    pub allocation_id: Address,
    pub epoch: u64,
    /// The epoch whose rebate pool is being claimed from.
    pub for_epoch: u64,
    pub tokens: BigInt,
    pub unclaimed_allocations_count: u64,
    pub delegation_fees: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterUpdated {
    pub param: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOperator {
    pub indexer: Address,
    pub operator: Address,
    pub allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationParametersUpdated {
    pub indexer: Address,
    pub indexing_reward_cut: u32,
    pub query_fee_cut: u32,
    pub cooldown_blocks: u64,
}
