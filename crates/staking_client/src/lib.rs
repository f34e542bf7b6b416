//! Read access to the live staking contract.
//!
//! A couple of staking events only say *that* something changed, not what it
//! changed to. For those the handlers read the current value from the
//! contract through a [`StakingContract`].

mod rpc;

use async_trait::async_trait;
pub use rpc::RpcStakingContract;
use stakegraph_common_types::{Address, BigInt};

/// The staking contract's view of one indexer, as returned by
/// `stakes(address)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexerStakes {
    pub tokens_staked: BigInt,
    pub tokens_allocated: BigInt,
    pub tokens_locked: BigInt,
    pub tokens_locked_until: BigInt,
}

/// Names of the staking parameters announced by `ParameterUpdated(string)`.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "camelCase")]
pub enum StakingParameter {
    /// The curation contract address. Not tracked.
    Curation,
    ThawingPeriod,
    CurationPercentage,
    ProtocolPercentage,
    ChannelDisputeEpochs,
    MaxAllocationEpochs,
    DelegationCapacity,
    DelegationParametersCooldown,
    DelegationUnbondingPeriod,
}

impl StakingParameter {
    /// Name of the view function that returns the parameter's current value,
    /// if it is a number we track.
    pub fn getter(&self) -> Option<&'static str> {
        match self {
            Self::Curation => None,
            Self::ThawingPeriod => Some("thawingPeriod"),
            Self::CurationPercentage => Some("curationPercentage"),
            Self::ProtocolPercentage => Some("protocolPercentage"),
            Self::ChannelDisputeEpochs => Some("channelDisputeEpochs"),
            Self::MaxAllocationEpochs => Some("maxAllocationEpochs"),
            // The event name and the storage variable diverged upstream.
            Self::DelegationCapacity => Some("delegationRatio"),
            Self::DelegationParametersCooldown => Some("delegationParametersCooldown"),
            Self::DelegationUnbondingPeriod => Some("delegationUnbondingPeriod"),
        }
    }
}

/// Synchronous (from the handler's point of view) reads of contract state.
/// All reads are made as of the given block, so that replays see the same
/// values.
#[async_trait]
pub trait StakingContract: Send + Sync {
    /// `stakes(indexer)` on the staking contract at `contract`.
    async fn stakes(
        &self,
        contract: &Address,
        indexer: &Address,
        block: u64,
    ) -> anyhow::Result<IndexerStakes>;

    /// The current value of a numeric staking parameter.
    async fn parameter(
        &self,
        contract: &Address,
        parameter: StakingParameter,
        block: u64,
    ) -> anyhow::Result<BigInt>;
}
