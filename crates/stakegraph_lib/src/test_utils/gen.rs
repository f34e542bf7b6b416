use std::collections::BTreeMap;

use rand::Rng;
use stakegraph_common_types::Address;

use super::address;
use super::events::*;
use crate::events::Event;

#[derive(Debug, Default, Clone, Copy)]
struct IndexerModel {
    staked: u64,
    locked: u64,
}

/// A random but valid sequence of deposits, locks and withdrawals across
/// `num_indexers` indexers. Locks never exceed the stake and withdrawals
/// always take the whole locked amount, like the staking contract does.
pub fn gen_stake_events<R: Rng>(rng: &mut R, num_indexers: u64, num_events: usize) -> Vec<Event> {
    let mut model = BTreeMap::<u64, IndexerModel>::new();
    let mut events = Vec::with_capacity(num_events);

    while events.len() < num_events {
        let n = rng.gen_range(1..=num_indexers);
        let indexer = address(n);
        let state = model.entry(n).or_default();

        match rng.gen_range(0..3) {
            1 if state.staked > state.locked => {
                let extra = rng.gen_range(1..=state.staked - state.locked);
                state.locked += extra;
                events.push(stake_locked(indexer, state.locked, rng.gen_range(1..1000)));
            }
            2 if state.locked > 0 => {
                events.push(stake_withdrawn(indexer, state.locked));
                state.staked -= state.locked;
                state.locked = 0;
            }
            _ => {
                let amount = rng.gen_range(1..10_000);
                state.staked += amount;
                events.push(stake_deposited(indexer, amount));
            }
        }
    }

    events
}

#[derive(Debug, Default, Clone, Copy)]
struct PairModel {
    tokens: u64,
    shares: u64,
}

/// Random delegations and undelegations between `delegators` and
/// `indexers`. Undelegation never takes more than the pair holds.
pub fn gen_delegation_events<R: Rng>(
    rng: &mut R,
    indexers: &[Address],
    delegators: &[Address],
    num_events: usize,
) -> Vec<Event> {
    let mut model = BTreeMap::<(usize, usize), PairModel>::new();
    let mut events = Vec::with_capacity(num_events);

    while events.len() < num_events {
        let i = rng.gen_range(0..indexers.len());
        let d = rng.gen_range(0..delegators.len());
        let pair = model.entry((i, d)).or_default();

        if pair.tokens > 0 && rng.gen_bool(0.3) {
            let amount = rng.gen_range(1..=pair.tokens);
            let shares = rng.gen_range(0..=pair.shares);
            pair.tokens -= amount;
            pair.shares -= shares;
            events.push(stake_delegated_locked(
                indexers[i],
                delegators[d],
                amount,
                shares,
                rng.gen_range(1..1000),
            ));
        } else {
            let amount = rng.gen_range(1..5_000);
            let shares = rng.gen_range(1..=amount);
            pair.tokens += amount;
            pair.shares += shares;
            events.push(stake_delegated(indexers[i], delegators[d], amount, shares));
        }
    }

    events
}
