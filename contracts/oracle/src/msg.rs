use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Uint128;
use hub_apis::oracle_api::Price;
#[cfg(not(target_arch = "wasm32"))]
use {crate::state::config::Config, cw_controllers::AdminResponse, hub_attestation::Attestation};

pub type InstantiateMsg = hub_apis::oracle_api::InstantiateMsg;
pub type ExecuteMsg = hub_apis::oracle_api::ExecuteMsg;

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Returns the current configuration of the oracle contract.
    #[returns(Config)]
    Config {},
    /// Returns the current admin of the contract.
    #[returns(AdminResponse)]
    Admin {},
    /// Returns the epoch currently accepting price submissions.
    #[returns(EpochResponse)]
    CurrentEpoch {},
    /// Returns every published price.
    #[returns(PricesResponse)]
    Prices {},
    /// Returns the published price `name`, if any.
    #[returns(Option<PriceResponse>)]
    Price { name: String },
    /// Returns the price vectors submitted for `epoch`, or for the current epoch if unset.
    #[returns(EpochVotesResponse)]
    EpochVotes { epoch: Option<u64> },
    /// Returns the attestation of `epoch`, if it was not pruned.
    #[returns(Option<Attestation>)]
    Attestation { epoch: u64 },
}

#[cw_serde]
pub struct EpochResponse {
    pub epoch: u64,
    pub epoch_length: u64,
}

#[cw_serde]
pub struct PriceResponse {
    pub name: String,
    /// Fixed point value with 18 decimals
    pub value: Uint128,
    /// Epoch that published the value
    pub epoch: u64,
}

#[cw_serde]
pub struct PricesResponse {
    pub prices: Vec<PriceResponse>,
}

#[cw_serde]
pub struct EpochVote {
    pub validator: String,
    pub prices: Vec<Price>,
}

#[cw_serde]
pub struct EpochVotesResponse {
    pub epoch: u64,
    /// Submissions in arrival order
    pub votes: Vec<EpochVote>,
}
