//! One handler per staking event.
//!
//! A handler reads what it needs through the [`HandlerContext`], mutates the
//! records in memory and stages their full new state. Nothing reaches the
//! store until the processor commits the context's cache, so a handler that
//! fails halfway leaves no trace.

mod allocation;
mod delegation;
mod protocol;
mod stake;

pub use allocation::{
    handle_allocation_closed, handle_allocation_collected, handle_allocation_created,
    handle_rebate_claimed,
};
pub use delegation::{
    handle_stake_delegated, handle_stake_delegated_locked, handle_stake_delegated_withdrawn,
};
pub use protocol::{
    handle_delegation_parameters_updated, handle_parameter_updated, handle_set_operator,
};
pub use stake::{
    handle_stake_deposited, handle_stake_locked, handle_stake_slashed, handle_stake_withdrawn,
};
use stakegraph_common_types::Block;
use stakegraph_staking_client::StakingContract;
use stakegraph_store::EntityCache;

use crate::events::Event;
use crate::ProcessingError;

/// Everything a handler may touch while applying one event.
pub struct HandlerContext<'a> {
    pub cache: EntityCache<'a>,
    pub contract: &'a dyn StakingContract,
    pub block: &'a Block,
}

impl<'a> HandlerContext<'a> {
    pub fn new(
        cache: EntityCache<'a>,
        contract: &'a dyn StakingContract,
        block: &'a Block,
    ) -> Self {
        Self {
            cache,
            contract,
            block,
        }
    }

    /// Creation timestamp for records materialized by this event.
    pub fn timestamp(&self) -> u64 {
        self.block.timestamp
    }
}

/// Applies `event` to the records visible through `ctx`.
pub async fn dispatch(ctx: &mut HandlerContext<'_>, event: &Event) -> Result<(), ProcessingError> {
    match event {
        Event::StakeDeposited(e) => handle_stake_deposited(ctx, e).await,
        Event::StakeLocked(e) => handle_stake_locked(ctx, e).await,
        Event::StakeWithdrawn(e) => handle_stake_withdrawn(ctx, e).await,
        Event::StakeSlashed(e) => handle_stake_slashed(ctx, e).await,
        Event::StakeDelegated(e) => handle_stake_delegated(ctx, e).await,
        Event::StakeDelegatedLocked(e) => handle_stake_delegated_locked(ctx, e).await,
        Event::StakeDelegatedWithdrawn(e) => handle_stake_delegated_withdrawn(ctx, e).await,
        Event::AllocationCreated(e) => handle_allocation_created(ctx, e).await,
        Event::AllocationCollected(e) => handle_allocation_collected(ctx, e).await,
        Event::AllocationClosed(e) => handle_allocation_closed(ctx, e).await,
        Event::RebateClaimed(e) => handle_rebate_claimed(ctx, e).await,
        Event::ParameterUpdated(e) => handle_parameter_updated(ctx, e).await,
        Event::SetOperator(e) => handle_set_operator(ctx, e).await,
        Event::DelegationParametersUpdated(e) => handle_delegation_parameters_updated(ctx, e).await,
    }
}
