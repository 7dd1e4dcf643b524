use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Order, StdResult, Storage, Uint128};
use cw_storage_plus::{Item, Map};

use crate::state::pool::OutgoingTx;
use crate::state::signers::Confirm;

/// Withdrawals of one denom committed for execution on the external chain.
#[cw_serde]
pub struct OutgoingTxBatch {
    pub nonce: u64,
    pub denom: String,
    /// Highest fee first
    pub transactions: Vec<OutgoingTx>,
    /// Height at which the batch was built
    pub height: u64,
}

impl OutgoingTxBatch {
    pub fn total_fee(&self) -> Uint128 {
        self.transactions.iter().map(|tx| tx.fee).sum()
    }
}

pub(crate) const LAST_BATCH_NONCE: Item<u64> = Item::new("last_batch_nonce");
pub(crate) const BATCHES: Map<u64, OutgoingTxBatch> = Map::new("batches");
pub(crate) const BATCH_CONFIRMS: Map<(u64, &str), Confirm> = Map::new("batch_confirms");

pub(crate) fn next_batch_nonce(storage: &mut dyn Storage) -> StdResult<u64> {
    let nonce = LAST_BATCH_NONCE.may_load(storage)?.unwrap_or_default() + 1;
    LAST_BATCH_NONCE.save(storage, &nonce)?;
    Ok(nonce)
}

/// Deletes a batch and every confirmation of it.
pub(crate) fn remove_batch(storage: &mut dyn Storage, nonce: u64) -> StdResult<()> {
    let signers = BATCH_CONFIRMS
        .prefix(nonce)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<String>>>()?;
    for signer in signers {
        BATCH_CONFIRMS.remove(storage, (nonce, signer.as_str()));
    }
    BATCHES.remove(storage, nonce);
    Ok(())
}
