/// Price oracle messages / API
use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

#[cw_serde]
#[derive(Default)]
pub struct InstantiateMsg {
    pub admin: Option<String>,
    pub epoch_length: Option<u64>,
    pub required_prices: Option<Vec<String>>,
    pub claims_window: Option<u64>,
}

/// A named price, fixed point with 18 decimals.
#[cw_serde]
pub struct Price {
    pub name: String,
    pub value: Uint128,
}

#[cw_serde]
/// hub_oracle execution handlers
pub enum ExecuteMsg {
    /// Change the admin
    UpdateAdmin { admin: Option<String> },
    /// Update oracle parameters. Admin only. Unset fields are left unchanged.
    UpdateConfig {
        epoch_length: Option<u64>,
        required_prices: Option<Vec<String>>,
        claims_window: Option<u64>,
    },
    /// Submits the sender's price vector for the current epoch.
    SubmitPrices { epoch: u64, prices: Vec<Price> },
}
