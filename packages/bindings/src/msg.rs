//! Custom messages the bridge contracts send to the hub chain.
//!
//! - MintTokens: mints vouchers for assets locked on the external chain
//! - JailValidator: jails a validator that did not sign a validator set update

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Coin, CosmosMsg};

/// Message that the bridge contracts can send to the hub chain.
/// The hub chain has to register a wasm binding handling these messages.
#[cw_serde]
pub enum HubMsg {
    /// Mints the requested vouchers to `recipient`.
    /// Only the bridge contract is allowed to send it.
    MintTokens { amount: Coin, recipient: String },
    /// Jails a bonded validator.
    /// Sent by the bridge when a validator misses the signing window of a validator set.
    JailValidator { validator: String },
}

// make HubMsg to implement CosmosMsg::CustomMsg
impl cosmwasm_std::CustomMsg for HubMsg {}

impl From<HubMsg> for CosmosMsg<HubMsg> {
    fn from(original: HubMsg) -> Self {
        CosmosMsg::Custom(original)
    }
}
