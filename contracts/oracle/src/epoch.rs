use std::collections::{BTreeMap, BTreeSet};

use cosmwasm_logging::{info, warn};
use cosmwasm_std::{Event, Response, StdError, Storage, Uint128};

use hub_apis::oracle_api::Price;
use hub_attestation::{
    load_attestation, load_claim, observation_event, record_claim, save_attestation,
    try_attestation, vote, Attestation, StoredClaim, Tally, VotingPowerOracle,
};
use hub_bindings::HubMsg;

use crate::error::ContractError;
use crate::state::config::Config;
use crate::state::prices::{
    price_claim_hash, PublishedPrice, CURRENT_EPOCH, PRICES, PRICE_CLAIM_TYPE,
};

/// Records the price vector of `claimer` for the current epoch and adds its vote to the epoch
/// attestation. The attestation is only evaluated when the epoch closes.
pub fn submit_prices(
    storage: &mut dyn Storage,
    powers: &dyn VotingPowerOracle,
    cfg: &Config,
    claimer: &str,
    epoch: u64,
    prices: Vec<Price>,
    height: u64,
) -> Result<Response<HubMsg>, ContractError> {
    let current = CURRENT_EPOCH.load(storage)?;
    if epoch != current {
        return Err(ContractError::WrongEpoch {
            current,
            submitted: epoch,
        });
    }
    validate_prices(&prices, &cfg.required_prices)?;

    let claim_hash = price_claim_hash();
    record_claim(
        storage,
        PRICE_CLAIM_TYPE,
        &StoredClaim {
            claimer: claimer.to_string(),
            nonce: epoch,
            claim_hash: claim_hash.clone().into(),
            height,
            claim: prices,
        },
    )?;
    let att = vote(
        storage,
        powers,
        PRICE_CLAIM_TYPE,
        claimer,
        epoch,
        &claim_hash,
        height,
    )?;
    save_attestation(storage, &att)?;

    Ok(Response::new()
        .set_data(att.id())
        .add_attribute("action", "submit_prices")
        .add_attribute("validator", claimer)
        .add_attribute("epoch", epoch.to_string()))
}

fn validate_prices(prices: &[Price], required: &[String]) -> Result<(), ContractError> {
    let mut names = BTreeSet::new();
    for price in prices {
        if price.value.is_zero() {
            return Err(ContractError::InvalidPrice(price.name.clone()));
        }
        if !names.insert(price.name.as_str()) {
            return Err(ContractError::DuplicatePrice(price.name.clone()));
        }
    }
    match required.iter().find(|name| !names.contains(name.as_str())) {
        Some(missing) => Err(ContractError::MissingPrice(missing.clone())),
        None => Ok(()),
    }
}

/// Closes the current epoch and opens the next one.
///
/// If the voters of the closed epoch hold quorum power, the median of their values is
/// published for every submitted price. An epoch that lacks a required price publishes
/// nothing, and the previous values stay in place.
pub fn advance_epoch(
    storage: &mut dyn Storage,
    powers: &dyn VotingPowerOracle,
    cfg: &Config,
) -> Result<Response<HubMsg>, ContractError> {
    let closed = CURRENT_EPOCH.load(storage)?;
    let epoch = closed + 1;
    CURRENT_EPOCH.save(storage, &epoch)?;

    let mut res = Response::new()
        .add_event(Event::new("epoch_advanced").add_attribute("epoch", epoch.to_string()));

    let Some(mut att) = load_attestation(storage, closed, &price_claim_hash())? else {
        info!("epoch {} closed without submissions", closed);
        return Ok(res);
    };

    let tally = try_attestation(storage, powers, &mut att, |store, att| {
        publish_prices(store, att, &cfg.required_prices)
    })?;
    save_attestation(storage, &att)?;

    match tally {
        Tally::Observed(effects) => {
            res = res
                .add_events(effects.events)
                .add_event(observation_event(&att, "success"));
        }
        Tally::Failed(reason) => {
            warn!("prices of epoch {} were not published: {}", closed, reason);
            res = res.add_event(observation_event(&att, "failed").add_attribute("reason", reason));
        }
        Tally::Pending => info!("epoch {} closed without quorum", closed),
        Tally::AlreadyObserved => {}
    }
    Ok(res)
}

fn publish_prices(
    store: &mut dyn Storage,
    att: &Attestation,
    required: &[String],
) -> Result<Response<HubMsg>, ContractError> {
    let mut values: BTreeMap<String, Vec<Uint128>> = BTreeMap::new();
    for voter in &att.votes {
        let submitted = load_claim::<Vec<Price>>(store, PRICE_CLAIM_TYPE, voter, att.nonce)?
            .ok_or_else(|| StdError::not_found(format!("price claim of {voter}")))?;
        for price in submitted.claim {
            values.entry(price.name).or_default().push(price.value);
        }
    }
    if let Some(missing) = required.iter().find(|name| !values.contains_key(name.as_str())) {
        return Err(ContractError::MissingPrice(missing.clone()));
    }

    let mut res = Response::new();
    for (name, mut submitted) in values {
        let value = median(&mut submitted).ok_or_else(|| ContractError::MissingPrice(name.clone()))?;
        PRICES.save(
            store,
            &name,
            &PublishedPrice {
                value,
                epoch: att.nonce,
            },
        )?;
        res = res.add_event(
            Event::new("price_published")
                .add_attribute("name", name)
                .add_attribute("value", value.to_string())
                .add_attribute("epoch", att.nonce.to_string()),
        );
    }
    Ok(res)
}

/// Middle value, or the floored mean of the two middle values for an even count.
pub(crate) fn median(values: &mut [Uint128]) -> Option<Uint128> {
    values.sort();
    let mid = values.len() / 2;
    match values.len() {
        0 => None,
        len if len % 2 == 1 => Some(values[mid]),
        _ => {
            let (low, high) = (values[mid - 1], values[mid]);
            Some(low + (high - low).multiply_ratio(1u128, 2u128))
        }
    }
}
