use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Order, StdResult, Storage};
use cw_storage_plus::{Item, Map};

use crate::state::signers::Confirm;

/// A member of the external signer set.
#[cw_serde]
pub struct BridgeValidator {
    /// Hub account of the validator
    pub validator: String,
    /// Signer address on the external chain
    pub external_address: String,
    /// Voting power at snapshot time
    pub power: u64,
}

/// Snapshot of the external signer set.
#[cw_serde]
pub struct Valset {
    pub nonce: u64,
    /// Sorted by power descending, then external address ascending
    pub members: Vec<BridgeValidator>,
    /// Height at which the snapshot was taken
    pub height: u64,
}

pub(crate) const LAST_VALSET_NONCE: Item<u64> = Item::new("last_valset_nonce");
/// Valset requests waiting to be executed on the external chain
pub(crate) const VALSET_REQUESTS: Map<u64, Valset> = Map::new("valset_requests");
/// Last valset executed on the external chain
pub(crate) const CURRENT_VALSET: Item<Valset> = Item::new("current_valset");
pub(crate) const VALSET_CONFIRMS: Map<(u64, &str), Confirm> = Map::new("valset_confirms");

pub(crate) fn next_valset_nonce(storage: &mut dyn Storage) -> StdResult<u64> {
    let nonce = LAST_VALSET_NONCE.may_load(storage)?.unwrap_or_default() + 1;
    LAST_VALSET_NONCE.save(storage, &nonce)?;
    Ok(nonce)
}

/// Newest pending request, or the current valset if none is pending.
pub(crate) fn latest_valset(storage: &dyn Storage) -> StdResult<Option<Valset>> {
    let pending = VALSET_REQUESTS
        .range(storage, None, None, Order::Descending)
        .next()
        .transpose()?;
    match pending {
        Some((_, valset)) => Ok(Some(valset)),
        None => CURRENT_VALSET.may_load(storage),
    }
}

/// Deletes a valset request and every confirmation of it.
pub(crate) fn remove_valset_request(storage: &mut dyn Storage, nonce: u64) -> StdResult<()> {
    let signers = VALSET_CONFIRMS
        .prefix(nonce)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<String>>>()?;
    for signer in signers {
        VALSET_CONFIRMS.remove(storage, (nonce, signer.as_str()));
    }
    VALSET_REQUESTS.remove(storage, nonce);
    Ok(())
}
