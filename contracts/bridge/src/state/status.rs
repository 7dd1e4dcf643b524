use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdResult, Storage};
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub enum TxStatus {
    /// Deposit observed and credited on the hub
    DepositReceived,
    /// Withdrawal included in a batch
    BatchCreated,
    /// Batch containing the withdrawal executed on the external chain
    BatchExecuted,
    /// Funds returned to the sender
    Refunded,
}

#[cw_serde]
pub struct TxStatusRecord {
    pub status: TxStatus,
    /// Batch nonce or external transaction hash, depending on the status
    pub info: Option<String>,
    pub height: u64,
}

/// Status of bridged transactions, by originating transaction hash
pub(crate) const TX_STATUS: Map<&str, TxStatusRecord> = Map::new("tx_status");
/// Highest event nonce whose attestation was observed
pub(crate) const LAST_OBSERVED_NONCE: Item<u64> = Item::new("last_observed_nonce");

pub(crate) fn set_tx_status(
    storage: &mut dyn Storage,
    tx_hash: &str,
    status: TxStatus,
    info: Option<String>,
    height: u64,
) -> StdResult<()> {
    TX_STATUS.save(
        storage,
        tx_hash,
        &TxStatusRecord {
            status,
            info,
            height,
        },
    )
}

pub(crate) fn observe_nonce(storage: &mut dyn Storage, nonce: u64) -> StdResult<()> {
    let last = LAST_OBSERVED_NONCE.may_load(storage)?.unwrap_or_default();
    if nonce > last {
        LAST_OBSERVED_NONCE.save(storage, &nonce)?;
    }
    Ok(())
}
