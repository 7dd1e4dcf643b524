//! Digests validators sign for the external chain.

use sha2::{Digest, Sha256};

use crate::state::batch::OutgoingTxBatch;
use crate::state::config::Config;
use crate::state::valset::Valset;

const VALSET_METHOD: &[u8] = b"checkpoint";
const BATCH_METHOD: &[u8] = b"transactionBatch";

/// Writes `bytes` behind its big endian length, so adjacent fields cannot shift into each other.
fn update_prefixed(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

fn bridge_hasher(cfg: &Config, method: &[u8], nonce: u64) -> Sha256 {
    let mut hasher = Sha256::new();
    update_prefixed(&mut hasher, cfg.bridge_contract.as_bytes());
    hasher.update(cfg.bridge_chain_id.to_be_bytes());
    hasher.update(method);
    hasher.update(nonce.to_be_bytes());
    hasher
}

/// `sha256(bridge_contract | bridge_chain_id | "checkpoint" | nonce | members)`, strings prefixed
/// with their u64 length
pub fn valset_checkpoint(cfg: &Config, valset: &Valset) -> [u8; 32] {
    let mut hasher = bridge_hasher(cfg, VALSET_METHOD, valset.nonce);
    for member in &valset.members {
        update_prefixed(&mut hasher, member.external_address.as_bytes());
        hasher.update(member.power.to_be_bytes());
    }
    hasher.finalize().into()
}

/// `sha256(bridge_contract | bridge_chain_id | "transactionBatch" | nonce | denom | txs)`, strings
/// prefixed with their u64 length
pub fn batch_checkpoint(cfg: &Config, batch: &OutgoingTxBatch) -> [u8; 32] {
    let mut hasher = bridge_hasher(cfg, BATCH_METHOD, batch.nonce);
    update_prefixed(&mut hasher, batch.denom.as_bytes());
    for tx in &batch.transactions {
        hasher.update(tx.id.to_be_bytes());
        update_prefixed(&mut hasher, tx.destination.as_bytes());
        hasher.update(tx.amount.amount.u128().to_be_bytes());
        hasher.update(tx.fee.u128().to_be_bytes());
    }
    hasher.finalize().into()
}
