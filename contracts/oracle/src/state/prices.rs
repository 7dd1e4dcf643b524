use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;
use cw_storage_plus::{Item, Map};
use sha2::{Digest, Sha256};

/// Claim type of price vectors in the claim ledger
pub const PRICE_CLAIM_TYPE: &str = "price";

/// Epoch currently accepting submissions. Starts at 1.
pub(crate) const CURRENT_EPOCH: Item<u64> = Item::new("current_epoch");

/// Latest published value of every price. A price keeps its value until an epoch publishes it
/// again.
pub(crate) const PRICES: Map<&str, PublishedPrice> = Map::new("prices");

#[cw_serde]
pub struct PublishedPrice {
    pub value: Uint128,
    /// Epoch that published the value
    pub epoch: u64,
}

/// Every submission of an epoch votes for the same attestation, whatever its values.
/// The values are read back from the claim ledger when the epoch closes.
pub fn price_claim_hash() -> Vec<u8> {
    Sha256::digest(b"price_claim").to_vec()
}
