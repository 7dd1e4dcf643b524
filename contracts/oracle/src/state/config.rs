use cosmwasm_schema::cw_serde;
use cw_controllers::Admin;
use cw_storage_plus::Item;
use derivative::Derivative;

use crate::error::ContractError;

pub(crate) const CONFIG: Item<Config> = Item::new("config");
/// Storage for admin
pub(crate) const ADMIN: Admin = Admin::new("admin");

pub const DEFAULT_EPOCH_LENGTH: u64 = 5;
pub const DEFAULT_CLAIMS_WINDOW: u64 = 10_000;

pub fn default_required_prices() -> Vec<String> {
    vec!["eth/0".to_string(), "eth/gas".to_string()]
}

/// Config are the price oracle parameters
#[cw_serde]
#[derive(Derivative)]
#[derivative(Default)]
pub struct Config {
    /// Number of blocks in an epoch. The epoch rolls over at every height divisible by it.
    #[derivative(Default(value = "DEFAULT_EPOCH_LENGTH"))]
    pub epoch_length: u64,
    /// Prices every submission must carry, and every published epoch must agree on
    #[derivative(Default(value = "default_required_prices()"))]
    pub required_prices: Vec<String>,
    /// Number of blocks price attestations are kept for
    #[derivative(Default(value = "DEFAULT_CLAIMS_WINDOW"))]
    pub claims_window: u64,
}

impl Config {
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.epoch_length == 0 {
            return Err(ContractError::InvalidEpochLength);
        }
        // attestations of the running epoch must outlive it
        if self.claims_window < self.epoch_length {
            return Err(ContractError::InvalidClaimsWindow {
                claims_window: self.claims_window,
                epoch_length: self.epoch_length,
            });
        }
        Ok(())
    }
}
