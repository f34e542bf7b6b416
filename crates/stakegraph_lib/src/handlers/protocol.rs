use std::str::FromStr;

use anyhow::anyhow;
use stakegraph_common_types::BigInt;
use stakegraph_staking_client::StakingParameter;
use stakegraph_store::models::GraphAccount;
use tracing::{debug, warn};

use super::HandlerContext;
use crate::events::{DelegationParametersUpdated, ParameterUpdated, SetOperator};
use crate::ids::account_id;
use crate::resolve::{create_or_load_graph_account, create_or_load_indexer, load, load_network, save};
use crate::ProcessingError;

/// The event only names the parameter; its new value is read from the
/// staking contract.
pub async fn handle_parameter_updated(
    ctx: &mut HandlerContext<'_>,
    event: &ParameterUpdated,
) -> Result<(), ProcessingError> {
    let parameter = match StakingParameter::from_str(&event.param) {
        Ok(StakingParameter::Curation) => {
            debug!("Curation contract changed; not tracked");
            return Ok(());
        }
        Ok(parameter) => parameter,
        Err(_) => {
            warn!(param = %event.param, "Ignoring update of unknown staking parameter");
            return Ok(());
        }
    };

    let mut network = load_network(&mut ctx.cache).await?;
    let value = ctx
        .contract
        .parameter(&network.staking, parameter, ctx.block.number)
        .await
        .map_err(ProcessingError::Contract)?;
    debug!(%parameter, %value, "Staking parameter updated");

    match parameter {
        StakingParameter::Curation => {}
        StakingParameter::ThawingPeriod => network.thawing_period = to_u64(parameter, &value)?,
        StakingParameter::CurationPercentage => {
            network.curation_percentage = to_u32(parameter, &value)?
        }
        StakingParameter::ProtocolPercentage => {
            network.protocol_fee_percentage = to_u32(parameter, &value)?
        }
        StakingParameter::ChannelDisputeEpochs => {
            network.channel_dispute_epochs = to_u64(parameter, &value)?
        }
        StakingParameter::MaxAllocationEpochs => {
            network.max_allocation_epochs = to_u64(parameter, &value)?
        }
        StakingParameter::DelegationCapacity => {
            network.delegation_capacity = to_u32(parameter, &value)?
        }
        // The unbonding period has no field of its own and shares the
        // cooldown's.
        StakingParameter::DelegationParametersCooldown
        | StakingParameter::DelegationUnbondingPeriod => {
            network.delegation_parameters_cooldown = to_u64(parameter, &value)?
        }
    }
    save(&mut ctx.cache, &network)
}

fn to_u64(parameter: StakingParameter, value: &BigInt) -> Result<u64, ProcessingError> {
    value.to_u64().ok_or_else(|| out_of_range(parameter, value))
}

fn to_u32(parameter: StakingParameter, value: &BigInt) -> Result<u32, ProcessingError> {
    value.to_u32().ok_or_else(|| out_of_range(parameter, value))
}

fn out_of_range(parameter: StakingParameter, value: &BigInt) -> ProcessingError {
    ProcessingError::Contract(anyhow!("{} value {} is out of range", parameter, value))
}

/// Grants or revokes `operator` for the indexer's account. Granting also
/// gives the operator an account of its own.
pub async fn handle_set_operator(
    ctx: &mut HandlerContext<'_>,
    event: &SetOperator,
) -> Result<(), ProcessingError> {
    let account_key = account_id(&event.indexer);
    let operator = account_id(&event.operator);

    let mut account = load::<GraphAccount>(&mut ctx.cache, &account_key).await?;
    if event.allowed {
        if account.operators.insert(operator.clone()) {
            create_or_load_graph_account(&mut ctx.cache, &operator, ctx.block.timestamp).await?;
        }
    } else {
        account.operators.remove(&operator);
    }
    save(&mut ctx.cache, &account)
}

pub async fn handle_delegation_parameters_updated(
    ctx: &mut HandlerContext<'_>,
    event: &DelegationParametersUpdated,
) -> Result<(), ProcessingError> {
    let id = account_id(&event.indexer);
    let timestamp = ctx.timestamp();

    let mut indexer = create_or_load_indexer(&mut ctx.cache, &id, timestamp).await?;
    indexer.indexing_reward_cut = event.indexing_reward_cut;
    indexer.query_fee_cut = event.query_fee_cut;
    indexer.delegator_parameter_cooldown = event.cooldown_blocks;
    indexer.last_delegation_parameter_update = timestamp;
    save(&mut ctx.cache, &indexer)
}
