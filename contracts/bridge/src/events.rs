use cosmwasm_std::{Coin, Event, Uint128};

use crate::state::batch::OutgoingTxBatch;
use crate::state::config::Config;
use crate::state::pool::OutgoingTx;
use crate::state::valset::Valset;

/// Status a validator moves to because of the bridge
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorStatus {
    /// Missed the signing window of a valset request
    Jailed,
}

impl ValidatorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidatorStatus::Jailed => "VALIDATOR_STATUS_JAILED",
        }
    }
}

pub fn validator_status_change_event(validator: &str, status: ValidatorStatus) -> Event {
    Event::new("validator_status_change")
        .add_attribute("validator", validator)
        .add_attribute("new_state", status.as_str())
}

pub fn deposit_received_event(
    tx_hash: &str,
    sender: &str,
    receiver: &str,
    minted: &Coin,
    commission: Uint128,
) -> Event {
    Event::new("deposit_received")
        .add_attribute("tx_hash", tx_hash)
        .add_attribute("sender", sender)
        .add_attribute("receiver", receiver)
        .add_attribute("amount", minted.to_string())
        .add_attribute("commission", commission.to_string())
}

pub fn withdraw_queued_event(tx: &OutgoingTx) -> Event {
    Event::new("withdraw_queued")
        .add_attribute("pool_id", tx.id.to_string())
        .add_attribute("sender", tx.sender.as_str())
        .add_attribute("destination", &tx.destination)
        .add_attribute("amount", tx.amount.to_string())
        .add_attribute("fee", tx.fee.to_string())
        .add_attribute("tx_hash", &tx.tx_hash)
}

pub fn refund_event(tx_hash: &str, recipient: &str, refunded: &Coin) -> Event {
    Event::new("refund")
        .add_attribute("tx_hash", tx_hash)
        .add_attribute("recipient", recipient)
        .add_attribute("amount", refunded.to_string())
}

pub fn outgoing_batch_event(cfg: &Config, batch: &OutgoingTxBatch) -> Event {
    let tx_hashes: Vec<&str> = batch
        .transactions
        .iter()
        .map(|tx| tx.tx_hash.as_str())
        .collect();
    Event::new("outgoing_batch")
        .add_attribute("bridge_contract", &cfg.bridge_contract)
        .add_attribute("bridge_chain_id", cfg.bridge_chain_id.to_string())
        .add_attribute("batch_nonce", batch.nonce.to_string())
        .add_attribute("denom", &batch.denom)
        .add_attribute("tx_count", batch.transactions.len().to_string())
        .add_attribute("tx_hashes", tx_hashes.join(","))
}

pub fn batch_canceled_event(cfg: &Config, nonce: u64) -> Event {
    Event::new("outgoing_batch_canceled")
        .add_attribute("bridge_contract", &cfg.bridge_contract)
        .add_attribute("bridge_chain_id", cfg.bridge_chain_id.to_string())
        .add_attribute("batch_nonce", nonce.to_string())
}

pub fn batch_executed_event(batch: &OutgoingTxBatch, tx_hash: &str) -> Event {
    Event::new("batch_executed")
        .add_attribute("batch_nonce", batch.nonce.to_string())
        .add_attribute("denom", &batch.denom)
        .add_attribute("tx_hash", tx_hash)
}

pub fn valset_request_event(cfg: &Config, valset: &Valset) -> Event {
    Event::new("valset_request")
        .add_attribute("bridge_contract", &cfg.bridge_contract)
        .add_attribute("bridge_chain_id", cfg.bridge_chain_id.to_string())
        .add_attribute("valset_nonce", valset.nonce.to_string())
        .add_attribute("members", valset.members.len().to_string())
}

pub fn valset_executed_event(nonce: u64) -> Event {
    Event::new("valset_executed").add_attribute("valset_nonce", nonce.to_string())
}
