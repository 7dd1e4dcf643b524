use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Empty, StdResult, Storage, Uint128};
use cw_storage_plus::{Item, Map};

/// A withdrawal waiting in the pool or in a batch.
#[cw_serde]
pub struct OutgoingTx {
    /// Sequential pool id
    pub id: u64,
    /// Hub account that paid for the withdrawal. The bridge itself for routed deposits.
    pub sender: Addr,
    /// Recipient on the external chain
    pub destination: String,
    pub amount: Coin,
    /// Bridge fee, in the denom of `amount`
    pub fee: Uint128,
    /// External account credited instead of `sender` when the entry expires
    pub refund_address: Option<String>,
    /// Hash of the originating transaction
    pub tx_hash: String,
    /// Block time of creation, in seconds
    pub created_at: u64,
    /// Block time after which the entry is refunded, in seconds. `None` never expires.
    pub expires_at: Option<u64>,
}

pub(crate) const LAST_POOL_ID: Item<u64> = Item::new("last_pool_id");
/// Every withdrawal not yet executed, batched or not, by pool id
pub(crate) const OUTGOING_POOL: Map<u64, OutgoingTx> = Map::new("outgoing_pool");
/// Withdrawals available for batching, by (denom, fee, u64::MAX - id).
/// Descending iteration yields the highest fee first, and the oldest entry among equal fees.
pub(crate) const UNBATCHED: Map<(&str, u128, u64), Empty> = Map::new("unbatched");
/// Expiring withdrawals available for batching, by (expires_at, id)
pub(crate) const POOL_EXPIRY: Map<(u64, u64), Empty> = Map::new("pool_expiry");

fn fee_key(tx: &OutgoingTx) -> (&str, u128, u64) {
    (tx.amount.denom.as_str(), tx.fee.u128(), u64::MAX - tx.id)
}

/// Pool id encoded in the last component of an [`UNBATCHED`] key.
pub(crate) fn pool_id(inverted_id: u64) -> u64 {
    u64::MAX - inverted_id
}

/// Makes `tx` available for batching.
pub(crate) fn index_pool_entry(storage: &mut dyn Storage, tx: &OutgoingTx) -> StdResult<()> {
    UNBATCHED.save(storage, fee_key(tx), &Empty {})?;
    if let Some(expires_at) = tx.expires_at {
        POOL_EXPIRY.save(storage, (expires_at, tx.id), &Empty {})?;
    }
    Ok(())
}

/// Hides `tx` from batching, without deleting it.
pub(crate) fn unindex_pool_entry(storage: &mut dyn Storage, tx: &OutgoingTx) {
    UNBATCHED.remove(storage, fee_key(tx));
    if let Some(expires_at) = tx.expires_at {
        POOL_EXPIRY.remove(storage, (expires_at, tx.id));
    }
}

pub(crate) fn next_pool_id(storage: &mut dyn Storage) -> StdResult<u64> {
    let id = LAST_POOL_ID.may_load(storage)?.unwrap_or_default() + 1;
    LAST_POOL_ID.save(storage, &id)?;
    Ok(id)
}
