use stakegraph_common_types::BigInt;
use stakegraph_lib::test_utils::events::*;
use stakegraph_lib::test_utils::{address, bytes32, tokens, TestHarness};
use stakegraph_store::models::{
    Allocation, AllocationStatus, DelegatedStake, Epoch, Indexer, Pool, SubgraphDeployment,
};

#[tokio::test]
async fn deposit_delegate_allocate_close() {
    let mut harness = TestHarness::new().await;
    let mut stream = EventStream::starting_at(10);

    let indexer = address(0xa1);
    let delegator = address(0xd1);
    let allocation = address(0xc1);
    let deployment = 0xde;

    let indexer_id = indexer.to_string();
    let allocation_id = allocation.to_string();
    let deployment_id = bytes32(deployment).to_string();

    //// Deposit
    harness
        .apply_all(&[stream.push(stake_deposited(indexer, 1000))])
        .await;
    assert_eq!(
        harness.load::<Indexer>(&indexer_id).await.staked_tokens,
        tokens(1000)
    );
    assert_eq!(harness.network().await.total_tokens_staked, tokens(1000));

    //// Delegate
    harness
        .apply_all(&[stream.push(stake_delegated(indexer, delegator, 200, 50))])
        .await;
    assert_eq!(
        harness.load::<Indexer>(&indexer_id).await.delegated_tokens,
        tokens(200)
    );
    let pair_id = format!("{}-{}", delegator, indexer);
    assert_eq!(
        harness.load::<DelegatedStake>(&pair_id).await.staked_tokens,
        tokens(200)
    );
    assert_eq!(harness.network().await.total_delegated_tokens, tokens(200));

    //// Allocate
    let allocate = stream.push(allocation_created(indexer, deployment, allocation, 500, 3));
    harness.apply_all(&[allocate.clone()]).await;
    let created = harness.load::<Allocation>(&allocation_id).await;
    assert_eq!(created.status, AllocationStatus::Active);
    assert_eq!(created.created_at_block_hash, allocate.block.hash);
    assert_eq!(created.created_at, allocate.block.timestamp);
    assert_eq!(created.indexer, indexer_id);
    assert_eq!(created.subgraph_deployment, deployment_id);
    assert_eq!(created.created_at_epoch, 3);
    assert!(created.effective_allocation.is_zero());
    assert!(created.price.is_zero());
    assert_eq!(
        harness.load::<Indexer>(&indexer_id).await.allocated_tokens,
        tokens(500)
    );
    assert_eq!(
        harness
            .load::<SubgraphDeployment>(&deployment_id)
            .await
            .staked_tokens,
        tokens(500)
    );

    //// Close
    harness
        .apply_all(&[stream.push(
            allocation_closed(indexer, deployment, allocation, 500, 480, 4).build(),
        )])
        .await;
    let closed = harness.load::<Allocation>(&allocation_id).await;
    assert_eq!(closed.status, AllocationStatus::Settled);
    assert_eq!(closed.effective_allocation, tokens(480));
    assert_eq!(closed.pool_settled_in.as_deref(), Some("4"));
    assert_eq!(closed.poi, Some(bytes32(0x9017)));
    assert_eq!(
        harness.load::<Indexer>(&indexer_id).await.allocated_tokens,
        BigInt::zero()
    );
    assert_eq!(harness.load::<Pool>("4").await.allocation, tokens(480));
}

#[tokio::test]
async fn fees_flow_from_collection_to_rebate() {
    let mut harness = TestHarness::new().await;
    let mut stream = EventStream::starting_at(10);

    let indexer = address(0xa1);
    let allocation = address(0xc1);
    let deployment = 0xde;
    let deployment_id = bytes32(deployment).to_string();
    let allocation_id = allocation.to_string();

    harness
        .apply_all(&[
            stream.push(stake_deposited(indexer, 1000)),
            stream.push(allocation_created(indexer, deployment, allocation, 600, 0)),
            stream.push(allocation_collected(indexer, deployment, allocation, 0, 10, 90)),
            stream.push(allocation_collected(indexer, deployment, allocation, 0, 5, 45)),
            stream.push(allocation_closed(indexer, deployment, allocation, 600, 590, 0).build()),
        ])
        .await;

    let collected = harness.load::<Allocation>(&allocation_id).await;
    assert_eq!(collected.query_fees_collected, tokens(135));
    assert_eq!(collected.curator_rewards, tokens(15));

    let pool = harness.load::<Pool>("0").await;
    assert_eq!(pool.total_query_fees, tokens(135));
    assert_eq!(pool.curator_rewards, tokens(15));
    assert_eq!(pool.allocation, tokens(590));

    let deployment_record = harness.load::<SubgraphDeployment>(&deployment_id).await;
    assert_eq!(deployment_record.query_fees_amount, tokens(135));
    assert_eq!(deployment_record.curator_fee_rewards, tokens(15));
    assert_eq!(harness.network().await.total_query_fees, tokens(135));
    assert_eq!(
        harness
            .load::<Indexer>(&indexer.to_string())
            .await
            .query_fees_collected,
        tokens(135)
    );

    // Claimed a few epochs later.
    stream.at_block(350);
    harness
        .apply_all(&[stream.push(rebate_claimed(indexer, deployment, allocation, 0, 120, 12))])
        .await;

    let claimed = harness.load::<Allocation>(&allocation_id).await;
    assert_eq!(claimed.status, AllocationStatus::Claimed);
    assert_eq!(claimed.query_fee_rebates, tokens(120));
    assert_eq!(claimed.delegation_fees, tokens(12));
    assert_eq!(harness.load::<Pool>("0").await.claimed_fees, tokens(120));
    assert_eq!(
        harness
            .load::<SubgraphDeployment>(&deployment_id)
            .await
            .query_fee_rebates,
        tokens(120)
    );
    assert_eq!(
        harness
            .load::<Indexer>(&indexer.to_string())
            .await
            .query_fee_rebates,
        tokens(120)
    );

    // Block 350 is in epoch 3 with 100-block epochs.
    let epoch = harness.load::<Epoch>("3").await;
    assert_eq!(epoch.query_fee_rebates, tokens(120));
    assert_eq!((epoch.start_block, epoch.end_block), (300, 399));
    let network = harness.network().await;
    assert_eq!(network.current_epoch, 3);
    assert_eq!(network.total_tokens_allocated, tokens(600 - 120));
}
