use stakegraph_common_types::BigInt;
use stakegraph_store::models::{DelegatedStake, Delegator, Indexer};

use super::HandlerContext;
use crate::events::{StakeDelegated, StakeDelegatedLocked, StakeDelegatedWithdrawn};
use crate::ids::{account_id, delegated_stake_id};
use crate::resolve::{
    create_or_load_delegated_stake, create_or_load_delegator, create_or_load_indexer, load,
    load_network, save,
};
use crate::ProcessingError;

pub async fn handle_stake_delegated(
    ctx: &mut HandlerContext<'_>,
    event: &StakeDelegated,
) -> Result<(), ProcessingError> {
    let indexer_id = account_id(&event.indexer);
    let delegator_id = account_id(&event.delegator);
    let created_at = ctx.timestamp();

    let mut indexer = create_or_load_indexer(&mut ctx.cache, &indexer_id, created_at).await?;
    indexer.delegated_tokens += &event.tokens;
    indexer.delegator_shares += &event.shares;
    save(&mut ctx.cache, &indexer)?;

    let mut delegator = create_or_load_delegator(&mut ctx.cache, &delegator_id, created_at).await?;
    delegator.total_staked_tokens += &event.tokens;
    save(&mut ctx.cache, &delegator)?;

    let mut stake =
        create_or_load_delegated_stake(&mut ctx.cache, &delegator_id, &indexer_id, created_at)
            .await?;
    stake.staked_tokens += &event.tokens;
    stake.share_amount += &event.shares;
    save(&mut ctx.cache, &stake)?;

    let mut network = load_network(&mut ctx.cache).await?;
    network.total_delegated_tokens += &event.tokens;
    save(&mut ctx.cache, &network)
}

/// Undelegation. The tokens move from staked to unstaked and stay locked
/// until `until`.
pub async fn handle_stake_delegated_locked(
    ctx: &mut HandlerContext<'_>,
    event: &StakeDelegatedLocked,
) -> Result<(), ProcessingError> {
    let indexer_id = account_id(&event.indexer);
    let delegator_id = account_id(&event.delegator);

    let mut indexer = load::<Indexer>(&mut ctx.cache, &indexer_id).await?;
    indexer.delegated_tokens -= &event.tokens;
    indexer.delegator_shares -= &event.shares;
    save(&mut ctx.cache, &indexer)?;

    let mut delegator = load::<Delegator>(&mut ctx.cache, &delegator_id).await?;
    delegator.total_unstaked_tokens += &event.tokens;
    save(&mut ctx.cache, &delegator)?;

    let stake_id = delegated_stake_id(&delegator_id, &indexer_id);
    let mut stake = load::<DelegatedStake>(&mut ctx.cache, &stake_id).await?;
    stake.unstaked_tokens += &event.tokens;
    stake.share_amount -= &event.shares;
    stake.locked_tokens += &event.tokens;
    // Every new undelegation pushes the unlock time of the whole locked
    // amount.
    stake.locked_until = event.until;
    save(&mut ctx.cache, &stake)?;

    let mut network = load_network(&mut ctx.cache).await?;
    network.total_delegated_tokens -= &event.tokens;
    save(&mut ctx.cache, &network)
}

pub async fn handle_stake_delegated_withdrawn(
    ctx: &mut HandlerContext<'_>,
    event: &StakeDelegatedWithdrawn,
) -> Result<(), ProcessingError> {
    let stake_id = delegated_stake_id(
        &account_id(&event.delegator),
        &account_id(&event.indexer),
    );

    let mut stake = load::<DelegatedStake>(&mut ctx.cache, &stake_id).await?;
    stake.locked_tokens = BigInt::zero();
    stake.locked_until = 0;
    save(&mut ctx.cache, &stake)
}
