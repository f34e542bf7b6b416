use stakegraph_store::models::Indexer;
use tracing::debug;

use super::HandlerContext;
use crate::events::{StakeDeposited, StakeLocked, StakeSlashed, StakeWithdrawn};
use crate::ids::account_id;
use crate::resolve::{create_or_load_epoch, create_or_load_indexer, load, load_network, save};
use crate::ProcessingError;

/// First deposit creates the indexer.
pub async fn handle_stake_deposited(
    ctx: &mut HandlerContext<'_>,
    event: &StakeDeposited,
) -> Result<(), ProcessingError> {
    let id = account_id(&event.indexer);
    let created_at = ctx.timestamp();

    let mut indexer = create_or_load_indexer(&mut ctx.cache, &id, created_at).await?;
    indexer.staked_tokens += &event.tokens;
    save(&mut ctx.cache, &indexer)?;

    let mut network = load_network(&mut ctx.cache).await?;
    network.total_tokens_staked += &event.tokens;
    save(&mut ctx.cache, &network)?;

    let mut epoch = create_or_load_epoch(&mut ctx.cache, ctx.block.number).await?;
    epoch.stake_deposited += &event.tokens;
    save(&mut ctx.cache, &epoch)
}

pub async fn handle_stake_locked(
    ctx: &mut HandlerContext<'_>,
    event: &StakeLocked,
) -> Result<(), ProcessingError> {
    let id = account_id(&event.indexer);

    let mut indexer = load::<Indexer>(&mut ctx.cache, &id).await?;
    // The event carries the new total, not an increment.
    indexer.locked_tokens = event.tokens.clone();
    indexer.tokens_locked_until = event.until;
    save(&mut ctx.cache, &indexer)?;

    let mut network = load_network(&mut ctx.cache).await?;
    network.total_unstaked_tokens_locked += &event.tokens;
    save(&mut ctx.cache, &network)
}

pub async fn handle_stake_withdrawn(
    ctx: &mut HandlerContext<'_>,
    event: &StakeWithdrawn,
) -> Result<(), ProcessingError> {
    let id = account_id(&event.indexer);

    let mut indexer = load::<Indexer>(&mut ctx.cache, &id).await?;
    indexer.staked_tokens -= &event.tokens;
    indexer.locked_tokens -= &event.tokens;
    indexer.tokens_locked_until = 0;
    save(&mut ctx.cache, &indexer)?;

    let mut network = load_network(&mut ctx.cache).await?;
    network.total_tokens_staked -= &event.tokens;
    network.total_unstaked_tokens_locked -= &event.tokens;
    save(&mut ctx.cache, &network)
}

/// The event doesn't say how many locked tokens the slash released, so the
/// new locked amount is read back from the staking contract.
pub async fn handle_stake_slashed(
    ctx: &mut HandlerContext<'_>,
    event: &StakeSlashed,
) -> Result<(), ProcessingError> {
    let id = account_id(&event.indexer);

    let mut indexer = load::<Indexer>(&mut ctx.cache, &id).await?;
    let mut network = load_network(&mut ctx.cache).await?;

    let stakes = ctx
        .contract
        .stakes(&network.staking, &event.indexer, ctx.block.number)
        .await
        .map_err(ProcessingError::Contract)?;
    debug!(
        indexer = %id,
        tokens = %event.tokens,
        locked = %stakes.tokens_locked,
        "Indexer slashed"
    );

    indexer.staked_tokens -= &event.tokens;
    indexer.locked_tokens = stakes.tokens_locked;
    save(&mut ctx.cache, &indexer)?;

    network.total_tokens_staked -= &event.tokens;
    save(&mut ctx.cache, &network)
}
