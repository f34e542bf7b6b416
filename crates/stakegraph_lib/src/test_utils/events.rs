//! Shorthands for building event streams in tests.

use stakegraph_common_types::{Address, BigInt};

use super::{block, bytes32, tokens};
use crate::events::*;

/// Hands out canonical positions: every event goes in its own block by
/// default, `same_block` keeps the next one in the current block.
#[derive(Debug, Clone)]
pub struct EventStream {
    block: u64,
    log_index: u64,
    same_block: bool,
}

impl EventStream {
    pub fn starting_at(block: u64) -> Self {
        Self {
            block,
            log_index: 0,
            same_block: true,
        }
    }

    /// The next event lands in the block of the previous one.
    pub fn same_block(&mut self) -> &mut Self {
        self.same_block = true;
        self
    }

    /// Jumps ahead to `block`.
    pub fn at_block(&mut self, block: u64) -> &mut Self {
        assert!(block > self.block, "blocks only move forward");
        self.block = block;
        self.log_index = 0;
        self.same_block = true;
        self
    }

    pub fn push(&mut self, event: Event) -> StakingEvent {
        if !self.same_block {
            self.block += 1;
            self.log_index = 0;
        }
        self.same_block = false;

        let staking_event = StakingEvent {
            block: block(self.block),
            log_index: self.log_index,
            event,
        };
        self.log_index += 1;
        staking_event
    }
}

pub fn stake_deposited(indexer: Address, amount: u64) -> Event {
    Event::StakeDeposited(StakeDeposited {
        indexer,
        tokens: tokens(amount),
    })
}

pub fn stake_locked(indexer: Address, amount: u64, until: u64) -> Event {
    Event::StakeLocked(StakeLocked {
        indexer,
        tokens: tokens(amount),
        until,
    })
}

pub fn stake_withdrawn(indexer: Address, amount: u64) -> Event {
    Event::StakeWithdrawn(StakeWithdrawn {
        indexer,
        tokens: tokens(amount),
    })
}

pub fn stake_slashed(indexer: Address, amount: u64, beneficiary: Address) -> Event {
    Event::StakeSlashed(StakeSlashed {
        indexer,
        tokens: tokens(amount),
        reward: tokens(amount / 2),
        beneficiary,
    })
}

pub fn stake_delegated(indexer: Address, delegator: Address, amount: u64, shares: u64) -> Event {
    Event::StakeDelegated(StakeDelegated {
        indexer,
        delegator,
        tokens: tokens(amount),
        shares: tokens(shares),
    })
}

pub fn stake_delegated_locked(
    indexer: Address,
    delegator: Address,
    amount: u64,
    shares: u64,
    until: u64,
) -> Event {
    Event::StakeDelegatedLocked(StakeDelegatedLocked {
        indexer,
        delegator,
        tokens: tokens(amount),
        shares: tokens(shares),
        until,
    })
}

pub fn stake_delegated_withdrawn(indexer: Address, delegator: Address, amount: u64) -> Event {
    Event::StakeDelegatedWithdrawn(StakeDelegatedWithdrawn {
        indexer,
        delegator,
        tokens: tokens(amount),
    })
}

pub fn allocation_created(
    indexer: Address,
    deployment: u64,
    allocation: Address,
    amount: u64,
    epoch: u64,
) -> Event {
    Event::AllocationCreated(AllocationCreated {
        indexer,
        subgraph_deployment_id: bytes32(deployment),
        epoch,
        tokens: tokens(amount),
        allocation_id: allocation,
        metadata: Default::default(),
    })
}

pub fn allocation_collected(
    indexer: Address,
    deployment: u64,
    allocation: Address,
    epoch: u64,
    curation_fees: u64,
    rebate_fees: u64,
) -> Event {
    Event::AllocationCollected(AllocationCollected {
        indexer,
        subgraph_deployment_id: bytes32(deployment),
        epoch,
        tokens: tokens(curation_fees + rebate_fees),
        allocation_id: allocation,
        from: indexer,
        curation_fees: tokens(curation_fees),
        rebate_fees: tokens(rebate_fees),
    })
}

/// Closed by the indexer itself unless `sender` says otherwise.
pub struct AllocationClosedBuilder {
    event: AllocationClosed,
}

impl AllocationClosedBuilder {
    pub fn sender(mut self, sender: Address) -> Self {
        self.event.sender = sender;
        self
    }

    pub fn poi(mut self, poi: u64) -> Self {
        self.event.poi = bytes32(poi);
        self
    }

    pub fn build(self) -> Event {
        Event::AllocationClosed(self.event)
    }
}

pub fn allocation_closed(
    indexer: Address,
    deployment: u64,
    allocation: Address,
    amount: u64,
    effective_allocation: u64,
    epoch: u64,
) -> AllocationClosedBuilder {
    AllocationClosedBuilder {
        event: AllocationClosed {
            indexer,
            subgraph_deployment_id: bytes32(deployment),
            epoch,
            tokens: tokens(amount),
            allocation_id: allocation,
            effective_allocation: tokens(effective_allocation),
            sender: indexer,
            poi: bytes32(0x9017),
        },
    }
}

pub fn rebate_claimed(
    indexer: Address,
    deployment: u64,
    allocation: Address,
    for_epoch: u64,
    amount: u64,
    delegation_fees: u64,
) -> Event {
    Event::RebateClaimed(RebateClaimed {
        indexer,
        subgraph_deployment_id: bytes32(deployment),
        allocation_id: allocation,
        epoch: for_epoch + 1,
        for_epoch,
        tokens: tokens(amount),
        unclaimed_allocations_count: 0,
        delegation_fees: BigInt::from(delegation_fees),
    })
}

pub fn parameter_updated(param: &str) -> Event {
    Event::ParameterUpdated(ParameterUpdated {
        param: param.to_string(),
    })
}

pub fn set_operator(indexer: Address, operator: Address, allowed: bool) -> Event {
    Event::SetOperator(SetOperator {
        indexer,
        operator,
        allowed,
    })
}

pub fn delegation_parameters_updated(
    indexer: Address,
    indexing_reward_cut: u32,
    query_fee_cut: u32,
    cooldown_blocks: u64,
) -> Event {
    Event::DelegationParametersUpdated(DelegationParametersUpdated {
        indexer,
        indexing_reward_cut,
        query_fee_cut,
        cooldown_blocks,
    })
}
