use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_json_vec, Binary, Empty, StdResult, Storage};
use cw_storage_plus::Map;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::AttestationError;

/// Last event nonce accepted from each claimer
const LAST_EVENT_NONCE: Map<&str, u64> = Map::new("last_event_nonce");

/// One validator's claim about one external event.
#[cw_serde]
pub struct StoredClaim<C> {
    pub claimer: String,
    /// Event nonce or epoch the claim refers to
    pub nonce: u64,
    /// Hash of the claim payload, shared by every claimer describing the same event
    pub claim_hash: Binary,
    /// Height at which the claim was recorded
    pub height: u64,
    pub claim: C,
}

/// Claims keyed by (claim type, claimer, nonce). Records are never deleted.
fn claims<'a, C>() -> Map<(&'a str, &'a str, u64), StoredClaim<C>> {
    Map::new("claims")
}

/// Hash identifying the event a claim describes, independently of who claims it.
pub fn claim_hash<C: Serialize>(claim: &C) -> StdResult<Vec<u8>> {
    let bytes = to_json_vec(claim)?;
    Ok(Sha256::digest(bytes).to_vec())
}

pub fn ensure_new_claim(
    storage: &dyn Storage,
    claim_type: &str,
    claimer: &str,
    nonce: u64,
) -> Result<(), AttestationError> {
    if claims::<Empty>().has(storage, (claim_type, claimer, nonce)) {
        return Err(AttestationError::DuplicateClaim {
            claim_type: claim_type.to_string(),
            claimer: claimer.to_string(),
            nonce,
        });
    }
    Ok(())
}

/// Stores a claim. Fails if the claimer already recorded a claim of this type at this nonce.
pub fn record_claim<C: Serialize + DeserializeOwned>(
    storage: &mut dyn Storage,
    claim_type: &str,
    claim: &StoredClaim<C>,
) -> Result<(), AttestationError> {
    ensure_new_claim(storage, claim_type, &claim.claimer, claim.nonce)?;
    claims().save(storage, (claim_type, claim.claimer.as_str(), claim.nonce), claim)?;
    Ok(())
}

pub fn load_claim<C: Serialize + DeserializeOwned>(
    storage: &dyn Storage,
    claim_type: &str,
    claimer: &str,
    nonce: u64,
) -> StdResult<Option<StoredClaim<C>>> {
    claims().may_load(storage, (claim_type, claimer, nonce))
}

/// Last event nonce accepted from `claimer`, `None` before its first claim.
pub fn last_event_nonce(storage: &dyn Storage, claimer: &str) -> StdResult<Option<u64>> {
    LAST_EVENT_NONCE.may_load(storage, claimer)
}

/// Accepts `nonce` only if it directly follows the last nonce accepted from `claimer`.
///
/// A claimer without history continues from `start`, so validators that bond after events
/// were observed cannot claim those events again.
pub fn advance_event_nonce(
    storage: &mut dyn Storage,
    claimer: &str,
    nonce: u64,
    start: u64,
) -> Result<(), AttestationError> {
    let expected = last_event_nonce(storage, claimer)?.unwrap_or(start) + 1;
    if nonce != expected {
        return Err(AttestationError::NonContiguousNonce {
            claimer: claimer.to_string(),
            expected,
            actual: nonce,
        });
    }
    LAST_EVENT_NONCE.save(storage, claimer, &nonce)?;
    Ok(())
}
