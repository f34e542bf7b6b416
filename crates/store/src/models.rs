//! The entity graph. One struct per entity kind, stored as JSON documents
//! with camelCase field names; token quantities are [`BigInt`]s and
//! serialize as decimal strings.

use std::collections::BTreeSet;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use stakegraph_common_types::{Address, BigInt, BlockHash, PoiBytes};

use crate::{Entity, EntityKind};

/// The id of the one and only [`GraphNetwork`] record.
pub const GRAPH_NETWORK_ID: &str = "1";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphAccount {
    pub id: String,
    pub created_at: u64,
    /// Accounts authorized to operate on behalf of this one.
    pub operators: BTreeSet<String>,
}

impl GraphAccount {
    pub fn new(id: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: id.into(),
            created_at,
            operators: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indexer {
    pub id: String,
    /// The [`GraphAccount`] behind this indexer; always equal to `id`.
    pub account: String,
    pub created_at: u64,

    pub staked_tokens: BigInt,
    pub allocated_tokens: BigInt,
    pub locked_tokens: BigInt,
    /// Block number until which `locked_tokens` are thawing; 0 if nothing is
    /// locked.
    pub tokens_locked_until: u64,
    pub query_fees_collected: BigInt,
    pub query_fee_rebates: BigInt,
    /// Allocations closed by someone other than the indexer itself.
    pub forced_settlements: u32,

    // Delegation pool
    pub delegated_tokens: BigInt,
    pub delegator_shares: BigInt,
    /// Parts per million.
    pub indexing_reward_cut: u32,
    /// Parts per million.
    pub query_fee_cut: u32,
    /// In blocks.
    pub delegator_parameter_cooldown: u64,
    /// Block timestamp of the last delegation parameter change.
    pub last_delegation_parameter_update: u64,
}

impl Indexer {
    pub fn new(id: impl Into<String>, created_at: u64) -> Self {
        let id = id.into();
        Self {
            account: id.clone(),
            id,
            created_at,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegator {
    pub id: String,
    pub account: String,
    pub created_at: u64,
    pub total_staked_tokens: BigInt,
    pub total_unstaked_tokens: BigInt,
}

impl Delegator {
    pub fn new(id: impl Into<String>, created_at: u64) -> Self {
        let id = id.into();
        Self {
            account: id.clone(),
            id,
            created_at,
            ..Default::default()
        }
    }
}

/// The relationship between one delegator and one indexer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatedStake {
    pub id: String,
    pub delegator: String,
    pub indexer: String,
    pub created_at: u64,
    pub staked_tokens: BigInt,
    pub unstaked_tokens: BigInt,
    pub locked_tokens: BigInt,
    pub locked_until: u64,
    pub share_amount: BigInt,
}

#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum AllocationStatus {
    #[default]
    Active,
    Settled,
    Claimed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub id: String,
    pub indexer: String,
    pub subgraph_deployment: String,
    pub allocated_tokens: BigInt,
    pub effective_allocation: BigInt,
    pub created_at_epoch: u64,
    pub created_at_block_hash: BlockHash,
    pub created_at: u64,
    pub query_fees_collected: BigInt,
    pub query_fee_rebates: BigInt,
    pub curator_rewards: BigInt,
    pub indexing_rewards: BigInt,
    pub delegation_fees: BigInt,
    /// No longer emitted by the protocol; always zero.
    pub price: BigInt,
    pub total_return: BigDecimal,
    pub annualized_return: BigDecimal,
    pub status: AllocationStatus,
    pub poi: Option<PoiBytes>,
    /// The [`Pool`] (epoch) this allocation was settled in.
    pub pool_settled_in: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphDeployment {
    pub id: String,
    pub created_at: u64,
    pub staked_tokens: BigInt,
    pub query_fees_amount: BigInt,
    pub curator_fee_rewards: BigInt,
    pub query_fee_rebates: BigInt,
}

impl SubgraphDeployment {
    pub fn new(id: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: id.into(),
            created_at,
            ..Default::default()
        }
    }
}

/// Fees and effective allocation settled within one epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub allocation: BigInt,
    pub total_query_fees: BigInt,
    pub claimed_fees: BigInt,
    pub curator_rewards: BigInt,
}

impl Pool {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Epoch {
    pub id: String,
    pub start_block: u64,
    pub end_block: u64,
    pub stake_deposited: BigInt,
    pub query_fee_rebates: BigInt,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNetwork {
    pub id: String,

    // Staking contract
    pub staking: Address,

    // Totals
    pub total_tokens_staked: BigInt,
    pub total_unstaked_tokens_locked: BigInt,
    pub total_delegated_tokens: BigInt,
    pub total_tokens_allocated: BigInt,
    pub total_query_fees: BigInt,

    // Staking parameters
    pub thawing_period: u64,
    /// Parts per million.
    pub curation_percentage: u32,
    /// Parts per million.
    pub protocol_fee_percentage: u32,
    pub channel_dispute_epochs: u64,
    pub max_allocation_epochs: u64,
    pub delegation_capacity: u32,
    pub delegation_parameters_cooldown: u64,

    // Epochs
    pub epoch_length: u64,
    pub last_length_update_block: u64,
    pub current_epoch: u64,
}

impl GraphNetwork {
    pub fn new(staking: Address, epoch_length: u64, start_block: u64, start_epoch: u64) -> Self {
        Self {
            id: GRAPH_NETWORK_ID.to_string(),
            staking,
            epoch_length,
            last_length_update_block: start_block,
            current_epoch: start_epoch,
            ..Default::default()
        }
    }
}

macro_rules! impl_entity {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Entity for $ty {
                const KIND: EntityKind = EntityKind::$ty;

                fn id(&self) -> &str {
                    &self.id
                }
            }
        )*
    };
}

impl_entity!(
    GraphAccount,
    GraphNetwork,
    Indexer,
    Delegator,
    DelegatedStake,
    Allocation,
    SubgraphDeployment,
    Pool,
    Epoch,
);
