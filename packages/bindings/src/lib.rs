mod msg;
mod query;

pub use msg::HubMsg;
pub use query::{
    BondedValidator, BondedValidatorsResponse, HubQuery, TotalPowerResponse,
    ValidatorPowerResponse,
};
