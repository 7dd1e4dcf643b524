use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::CustomQuery;

/// Staking queries answered by the hub chain.
#[cw_serde]
#[derive(QueryResponses)]
pub enum HubQuery {
    /// Current voting power of a validator, `None` if it is not bonded.
    #[returns(ValidatorPowerResponse)]
    ValidatorPower { validator: String },
    /// Sum of the voting power of all bonded validators.
    #[returns(TotalPowerResponse)]
    TotalPower {},
    /// All bonded validators with their voting power.
    #[returns(BondedValidatorsResponse)]
    BondedValidators {},
}

impl CustomQuery for HubQuery {}

#[cw_serde]
pub struct ValidatorPowerResponse {
    pub power: Option<u64>,
}

#[cw_serde]
pub struct TotalPowerResponse {
    pub power: u64,
}

#[cw_serde]
pub struct BondedValidator {
    /// Account address of the validator on the hub chain
    pub validator: String,
    pub power: u64,
}

#[cw_serde]
pub struct BondedValidatorsResponse {
    pub validators: Vec<BondedValidator>,
}
