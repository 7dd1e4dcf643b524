use cosmwasm_logging::{debug, error};
use cosmwasm_std::{Response, Storage};

use hub_apis::bridge_api::BridgeClaim;
use hub_attestation::{
    advance_event_nonce, claim_hash, observation_event, record_claim, save_attestation,
    try_attestation, vote, StoredClaim, Tally,
};
use hub_bindings::HubMsg;

use crate::dispatch::{self, BridgeContext};
use crate::error::ContractError;
use crate::state::status::{observe_nonce, LAST_OBSERVED_NONCE};

/// Records `claim` as the event at `event_nonce` seen by `claimer`, and applies it once the
/// claimers of the same event hold quorum power.
///
/// Event nonces of a claimer must be contiguous. A claimer's first claim follows the last observed
/// nonce. The response data is the attestation id.
pub(crate) fn submit_claim(
    storage: &mut dyn Storage,
    ctx: &BridgeContext,
    claimer: &str,
    event_nonce: u64,
    claim: BridgeClaim,
) -> Result<Response<HubMsg>, ContractError> {
    validate_claim(&claim)?;
    let last_observed = LAST_OBSERVED_NONCE.may_load(storage)?.unwrap_or_default();
    advance_event_nonce(storage, claimer, event_nonce, last_observed)?;

    let claim_type = claim.claim_type();
    let hash = claim_hash(&claim)?;
    let height = ctx.env.block.height;
    record_claim(
        storage,
        claim_type,
        &StoredClaim {
            claimer: claimer.to_string(),
            nonce: event_nonce,
            claim_hash: hash.clone().into(),
            height,
            claim: claim.clone(),
        },
    )?;

    let mut att = vote(
        storage,
        ctx.powers,
        claim_type,
        claimer,
        event_nonce,
        &hash,
        height,
    )?;
    let tally = try_attestation(storage, ctx.powers, &mut att, |store, _| {
        dispatch::apply_claim(store, ctx, &claim)
    })?;
    save_attestation(storage, &att)?;

    let mut res = Response::new()
        .set_data(att.id())
        .add_attribute("action", "submit_claim")
        .add_attribute("claimer", claimer)
        .add_attribute("event_nonce", event_nonce.to_string())
        .add_attribute("claim_type", claim_type);

    match tally {
        Tally::Observed(effects) => {
            observe_nonce(storage, event_nonce)?;
            res = res
                .add_submessages(effects.messages)
                .add_events(effects.events)
                .add_event(observation_event(&att, "success"));
        }
        Tally::Failed(reason) => {
            error!(
                "{} claim at nonce {} failed: {}",
                claim_type, event_nonce, reason
            );
            observe_nonce(storage, event_nonce)?;
            res = res.add_event(observation_event(&att, "failed").add_attribute("reason", reason));
        }
        Tally::Pending => debug!("{} claim at nonce {} pending", claim_type, event_nonce),
        Tally::AlreadyObserved => {}
    }
    Ok(res)
}

/// Rejects claims no quorum could ever make meaningful.
fn validate_claim(claim: &BridgeClaim) -> Result<(), ContractError> {
    match claim {
        BridgeClaim::Deposit {
            external_id,
            amount,
            receiver,
            tx_hash,
            ..
        } => {
            if amount.is_zero() {
                return Err(ContractError::InvalidAmount);
            }
            require("external_id", external_id)?;
            require("receiver", receiver)?;
            require("tx_hash", tx_hash)
        }
        BridgeClaim::SendToExternal {
            external_id,
            amount,
            sender,
            destination,
            tx_hash,
            ..
        } => {
            if amount.is_zero() {
                return Err(ContractError::InvalidAmount);
            }
            require("external_id", external_id)?;
            require("sender", sender)?;
            require("destination", destination)?;
            require("tx_hash", tx_hash)
        }
        BridgeClaim::WithdrawExecuted { tx_hash, .. } => require("tx_hash", tx_hash),
        BridgeClaim::ValsetExecuted { .. } => Ok(()),
    }
}

fn require(field: &str, value: &str) -> Result<(), ContractError> {
    if value.trim().is_empty() {
        return Err(ContractError::InvalidClaim(format!("{field} is empty")));
    }
    Ok(())
}
