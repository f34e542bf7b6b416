use stakegraph_common_types::{BigDecimal, BigInt};
use stakegraph_store::models::{Allocation, AllocationStatus, Indexer, Pool, SubgraphDeployment};
use tracing::debug;

use super::HandlerContext;
use crate::events::{AllocationClosed, AllocationCollected, AllocationCreated, RebateClaimed};
use crate::ids::{account_id, deployment_id, epoch_id};
use crate::resolve::{
    create_or_load_epoch, create_or_load_pool, create_or_load_subgraph_deployment, load,
    load_network, save,
};
use crate::ProcessingError;

pub async fn handle_allocation_created(
    ctx: &mut HandlerContext<'_>,
    event: &AllocationCreated,
) -> Result<(), ProcessingError> {
    let indexer_id = account_id(&event.indexer);
    let deployment_key = deployment_id(&event.subgraph_deployment_id);
    let allocation_id = account_id(&event.allocation_id);
    let created_at = ctx.timestamp();

    let mut indexer = load::<Indexer>(&mut ctx.cache, &indexer_id).await?;
    indexer.allocated_tokens += &event.tokens;
    save(&mut ctx.cache, &indexer)?;

    let mut network = load_network(&mut ctx.cache).await?;
    network.total_tokens_allocated += &event.tokens;
    save(&mut ctx.cache, &network)?;

    let mut deployment =
        create_or_load_subgraph_deployment(&mut ctx.cache, &deployment_key, created_at).await?;
    deployment.staked_tokens += &event.tokens;
    save(&mut ctx.cache, &deployment)?;

    let allocation = Allocation {
        id: allocation_id,
        indexer: indexer_id,
        subgraph_deployment: deployment_key,
        allocated_tokens: event.tokens.clone(),
        effective_allocation: BigInt::zero(),
        created_at_epoch: event.epoch,
        created_at_block_hash: ctx.block.hash.clone(),
        created_at,
        query_fees_collected: BigInt::zero(),
        query_fee_rebates: BigInt::zero(),
        curator_rewards: BigInt::zero(),
        indexing_rewards: BigInt::zero(),
        delegation_fees: BigInt::zero(),
        price: BigInt::zero(),
        total_return: BigDecimal::default(),
        annualized_return: BigDecimal::default(),
        status: AllocationStatus::Active,
        poi: None,
        pool_settled_in: None,
    };
    debug!(
        allocation = %allocation.id,
        deployment = %allocation.subgraph_deployment,
        tokens = %event.tokens,
        "Allocation created"
    );
    save(&mut ctx.cache, &allocation)
}

/// `rebateFees` are the query fees left after curation and protocol fees;
/// `curationFees` go to curators.
pub async fn handle_allocation_collected(
    ctx: &mut HandlerContext<'_>,
    event: &AllocationCollected,
) -> Result<(), ProcessingError> {
    let indexer_id = account_id(&event.indexer);
    let allocation_id = account_id(&event.allocation_id);
    let deployment_key = deployment_id(&event.subgraph_deployment_id);

    let mut indexer = load::<Indexer>(&mut ctx.cache, &indexer_id).await?;
    indexer.query_fees_collected += &event.rebate_fees;
    save(&mut ctx.cache, &indexer)?;

    let mut allocation = load::<Allocation>(&mut ctx.cache, &allocation_id).await?;
    allocation.query_fees_collected += &event.rebate_fees;
    allocation.curator_rewards += &event.curation_fees;
    save(&mut ctx.cache, &allocation)?;

    let mut pool = create_or_load_pool(&mut ctx.cache, event.epoch).await?;
    pool.total_query_fees += &event.rebate_fees;
    pool.curator_rewards += &event.curation_fees;
    save(&mut ctx.cache, &pool)?;

    let mut deployment = load::<SubgraphDeployment>(&mut ctx.cache, &deployment_key).await?;
    deployment.query_fees_amount += &event.rebate_fees;
    deployment.curator_fee_rewards += &event.curation_fees;
    save(&mut ctx.cache, &deployment)?;

    let mut network = load_network(&mut ctx.cache).await?;
    network.total_query_fees += &event.rebate_fees;
    save(&mut ctx.cache, &network)
}

/// Settles the allocation into the pool of `event.epoch`. Network totals
/// only drop when the rebate is claimed.
pub async fn handle_allocation_closed(
    ctx: &mut HandlerContext<'_>,
    event: &AllocationClosed,
) -> Result<(), ProcessingError> {
    let indexer_id = account_id(&event.indexer);
    let allocation_id = account_id(&event.allocation_id);
    let deployment_key = deployment_id(&event.subgraph_deployment_id);
    let created_at = ctx.timestamp();

    let mut indexer = load::<Indexer>(&mut ctx.cache, &indexer_id).await?;
    if event.sender != event.indexer {
        indexer.forced_settlements += 1;
    }
    indexer.allocated_tokens -= &event.tokens;
    save(&mut ctx.cache, &indexer)?;

    let mut allocation = load::<Allocation>(&mut ctx.cache, &allocation_id).await?;
    allocation.pool_settled_in = Some(epoch_id(event.epoch));
    allocation.effective_allocation = event.effective_allocation.clone();
    allocation.status = AllocationStatus::Settled;
    allocation.poi = Some(event.poi);
    save(&mut ctx.cache, &allocation)?;

    // Only materializes the epoch of the closing block.
    create_or_load_epoch(&mut ctx.cache, ctx.block.number).await?;

    let mut pool = create_or_load_pool(&mut ctx.cache, event.epoch).await?;
    pool.allocation += &event.effective_allocation;
    save(&mut ctx.cache, &pool)?;

    // Deployment stake goes up on close as well as on creation.
    let mut deployment =
        create_or_load_subgraph_deployment(&mut ctx.cache, &deployment_key, created_at).await?;
    deployment.staked_tokens += &event.tokens;
    save(&mut ctx.cache, &deployment)
}

pub async fn handle_rebate_claimed(
    ctx: &mut HandlerContext<'_>,
    event: &RebateClaimed,
) -> Result<(), ProcessingError> {
    let indexer_id = account_id(&event.indexer);
    let allocation_id = account_id(&event.allocation_id);
    let deployment_key = deployment_id(&event.subgraph_deployment_id);

    let mut indexer = load::<Indexer>(&mut ctx.cache, &indexer_id).await?;
    indexer.query_fee_rebates += &event.tokens;
    save(&mut ctx.cache, &indexer)?;

    let mut allocation = load::<Allocation>(&mut ctx.cache, &allocation_id).await?;
    // Last claim wins; this is not a running total.
    allocation.query_fee_rebates = event.tokens.clone();
    allocation.delegation_fees = event.delegation_fees.clone();
    allocation.status = AllocationStatus::Claimed;
    save(&mut ctx.cache, &allocation)?;

    let mut epoch = create_or_load_epoch(&mut ctx.cache, ctx.block.number).await?;
    epoch.query_fee_rebates += &event.tokens;
    save(&mut ctx.cache, &epoch)?;

    let mut pool = load::<Pool>(&mut ctx.cache, &epoch_id(event.for_epoch)).await?;
    pool.claimed_fees += &event.tokens;
    save(&mut ctx.cache, &pool)?;

    let mut deployment = load::<SubgraphDeployment>(&mut ctx.cache, &deployment_key).await?;
    deployment.query_fee_rebates += &event.tokens;
    save(&mut ctx.cache, &deployment)?;

    let mut network = load_network(&mut ctx.cache).await?;
    network.total_tokens_allocated -= &event.tokens;
    save(&mut ctx.cache, &network)
}
