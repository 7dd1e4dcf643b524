use cosmwasm_std::Order::Ascending;
use cosmwasm_std::{Binary, Deps, StdError, StdResult};
use cw_storage_plus::{Bound, Map};

use hub_attestation::last_event_nonce;
use hub_bindings::HubQuery;

use crate::checkpoint::{batch_checkpoint, valset_checkpoint};
use crate::error::ContractError;
use crate::fees::{self, OraclePrices};
use crate::msg::{
    BatchesResponse, CheckpointResponse, ConfirmsResponse, FeeEstimateResponse, NonceResponse,
    PoolResponse, ValsetsResponse,
};
use crate::outgoing;
use crate::state::batch::{OutgoingTxBatch, BATCHES, BATCH_CONFIRMS};
use crate::state::config::CONFIG;
use crate::state::signers::Confirm;
use crate::state::status::LAST_OBSERVED_NONCE;
use crate::state::valset::{VALSET_CONFIRMS, VALSET_REQUESTS};

// Settings for pagination
const MAX_LIMIT: u32 = 30;
const DEFAULT_LIMIT: u32 = 10;

/// Pending valset requests `validator` still has to sign, oldest first.
pub fn pending_valsets(deps: Deps<HubQuery>, validator: String) -> StdResult<ValsetsResponse> {
    let valsets = VALSET_REQUESTS
        .range(deps.storage, None, None, Ascending)
        .filter(|item| {
            !matches!(item, Ok((nonce, _))
                if VALSET_CONFIRMS.has(deps.storage, (*nonce, validator.as_str())))
        })
        .map(|item| item.map(|(_, valset)| valset))
        .collect::<StdResult<_>>()?;
    Ok(ValsetsResponse { valsets })
}

fn confirms(
    deps: Deps<HubQuery>,
    map: Map<(u64, &str), Confirm>,
    nonce: u64,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<ConfirmsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.as_deref().map(Bound::exclusive);
    let confirms = map
        .prefix(nonce)
        .range(deps.storage, start, None, Ascending)
        .take(limit)
        .map(|item| item.map(|(_, confirm)| confirm))
        .collect::<StdResult<_>>()?;
    Ok(ConfirmsResponse { confirms })
}

pub fn valset_confirms(
    deps: Deps<HubQuery>,
    nonce: u64,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<ConfirmsResponse> {
    confirms(deps, VALSET_CONFIRMS, nonce, start_after, limit)
}

pub fn batch_confirms(
    deps: Deps<HubQuery>,
    nonce: u64,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<ConfirmsResponse> {
    confirms(deps, BATCH_CONFIRMS, nonce, start_after, limit)
}

pub fn batches(
    deps: Deps<HubQuery>,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<BatchesResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);
    let batches = BATCHES
        .range(deps.storage, start, None, Ascending)
        .take(limit)
        .map(|item| item.map(|(_, batch)| batch))
        .collect::<StdResult<_>>()?;
    Ok(BatchesResponse { batches })
}

/// Oldest batch `validator` still has to sign.
pub fn pending_batch(
    deps: Deps<HubQuery>,
    validator: String,
) -> StdResult<Option<OutgoingTxBatch>> {
    for item in BATCHES.range(deps.storage, None, None, Ascending) {
        let (nonce, batch) = item?;
        if !BATCH_CONFIRMS.has(deps.storage, (nonce, validator.as_str())) {
            return Ok(Some(batch));
        }
    }
    Ok(None)
}

/// Last event nonce accepted from `validator`. Validators without claims continue from the last
/// observed nonce.
pub fn last_event_nonce_of(deps: Deps<HubQuery>, validator: String) -> StdResult<NonceResponse> {
    let nonce = match last_event_nonce(deps.storage, &validator)? {
        Some(nonce) => nonce,
        None => last_observed_nonce(deps)?.nonce,
    };
    Ok(NonceResponse { nonce })
}

pub fn last_observed_nonce(deps: Deps<HubQuery>) -> StdResult<NonceResponse> {
    Ok(NonceResponse {
        nonce: LAST_OBSERVED_NONCE
            .may_load(deps.storage)?
            .unwrap_or_default(),
    })
}

pub fn outgoing_pool(
    deps: Deps<HubQuery>,
    denom: String,
    limit: Option<u32>,
) -> Result<PoolResponse, ContractError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    Ok(PoolResponse {
        transactions: outgoing::unbatched(deps.storage, &denom, limit)?,
    })
}

pub fn fee_estimate(
    deps: Deps<HubQuery>,
    denom: String,
) -> Result<FeeEstimateResponse, ContractError> {
    let cfg = CONFIG.load(deps.storage)?;
    let coin = cfg.coin_by_denom(&denom)?;
    let prices = OraclePrices::new(&deps.querier, cfg.oracle.as_ref());
    fees::estimate(&prices, &cfg, coin)
}

pub fn valset_checkpoint_of(deps: Deps<HubQuery>, nonce: u64) -> StdResult<CheckpointResponse> {
    let cfg = CONFIG.load(deps.storage)?;
    let valset = VALSET_REQUESTS
        .may_load(deps.storage, nonce)?
        .ok_or_else(|| StdError::not_found(format!("valset {nonce}")))?;
    Ok(CheckpointResponse {
        checkpoint: Binary::from(valset_checkpoint(&cfg, &valset).to_vec()),
    })
}

pub fn batch_checkpoint_of(deps: Deps<HubQuery>, nonce: u64) -> StdResult<CheckpointResponse> {
    let cfg = CONFIG.load(deps.storage)?;
    let batch = BATCHES
        .may_load(deps.storage, nonce)?
        .ok_or_else(|| StdError::not_found(format!("batch {nonce}")))?;
    Ok(CheckpointResponse {
        checkpoint: Binary::from(batch_checkpoint(&cfg, &batch).to_vec()),
    })
}
