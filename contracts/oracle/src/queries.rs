use cosmwasm_std::Order::Ascending;
use cosmwasm_std::{Deps, StdResult};

use hub_apis::oracle_api::Price;
use hub_attestation::{load_attestation, load_claim, Attestation};
use hub_bindings::HubQuery;

use crate::msg::{EpochResponse, EpochVote, EpochVotesResponse, PriceResponse, PricesResponse};
use crate::state::config::CONFIG;
use crate::state::prices::{price_claim_hash, CURRENT_EPOCH, PRICES, PRICE_CLAIM_TYPE};

pub fn current_epoch(deps: Deps<HubQuery>) -> StdResult<EpochResponse> {
    Ok(EpochResponse {
        epoch: CURRENT_EPOCH.load(deps.storage)?,
        epoch_length: CONFIG.load(deps.storage)?.epoch_length,
    })
}

pub fn prices(deps: Deps<HubQuery>) -> StdResult<PricesResponse> {
    let prices = PRICES
        .range(deps.storage, None, None, Ascending)
        .map(|item| {
            item.map(|(name, price)| PriceResponse {
                name,
                value: price.value,
                epoch: price.epoch,
            })
        })
        .collect::<StdResult<_>>()?;
    Ok(PricesResponse { prices })
}

pub fn price(deps: Deps<HubQuery>, name: String) -> StdResult<Option<PriceResponse>> {
    Ok(PRICES
        .may_load(deps.storage, &name)?
        .map(|price| PriceResponse {
            name,
            value: price.value,
            epoch: price.epoch,
        }))
}

pub fn epoch_votes(deps: Deps<HubQuery>, epoch: Option<u64>) -> StdResult<EpochVotesResponse> {
    let epoch = match epoch {
        Some(epoch) => epoch,
        None => CURRENT_EPOCH.load(deps.storage)?,
    };
    let voters = load_attestation(deps.storage, epoch, &price_claim_hash())?
        .map(|att| att.votes)
        .unwrap_or_default();

    let mut votes = Vec::with_capacity(voters.len());
    for validator in voters {
        if let Some(claim) =
            load_claim::<Vec<Price>>(deps.storage, PRICE_CLAIM_TYPE, &validator, epoch)?
        {
            votes.push(EpochVote {
                validator,
                prices: claim.claim,
            });
        }
    }
    Ok(EpochVotesResponse { epoch, votes })
}

pub fn attestation(deps: Deps<HubQuery>, epoch: u64) -> StdResult<Option<Attestation>> {
    load_attestation(deps.storage, epoch, &price_claim_hash())
}
