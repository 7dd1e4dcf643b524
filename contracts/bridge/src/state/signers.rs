use cosmwasm_schema::cw_serde;
use cosmwasm_std::Binary;
use cw_storage_plus::Map;

/// Key a validator signs checkpoints with on the external chain.
#[cw_serde]
pub struct ExternalSigner {
    pub external_address: String,
    /// secp256k1 public key
    pub pubkey: Binary,
}

/// A validator's signature over a valset or batch checkpoint.
#[cw_serde]
pub struct Confirm {
    pub validator: String,
    pub external_address: String,
    pub signature: Binary,
    pub height: u64,
}

/// Signer keys by validator
pub(crate) const SIGNERS: Map<&str, ExternalSigner> = Map::new("signers");
/// Validator owning each registered external address
pub(crate) const SIGNER_OWNERS: Map<&str, String> = Map::new("signer_owners");
