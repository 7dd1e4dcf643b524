use std::collections::BTreeMap;

use cosmwasm_std::{QuerierWrapper, QueryRequest, StdResult};

use hub_bindings::{
    BondedValidator, BondedValidatorsResponse, HubQuery, TotalPowerResponse,
    ValidatorPowerResponse,
};

/// Source of stake weighted voting power.
///
/// On chain this is the hub's staking module, reached through [`HubQuery`]. Tests and
/// snapshot evaluation use a [`PowerTable`].
pub trait VotingPowerOracle {
    /// Current voting power of `validator`, `None` if it is not bonded.
    fn power_of(&self, validator: &str) -> StdResult<Option<u64>>;

    /// Total voting power of the bonded set.
    fn total_power(&self) -> StdResult<u64>;

    /// Every bonded validator with its voting power.
    fn bonded_validators(&self) -> StdResult<Vec<BondedValidator>>;
}

impl VotingPowerOracle for QuerierWrapper<'_, HubQuery> {
    fn power_of(&self, validator: &str) -> StdResult<Option<u64>> {
        let res: ValidatorPowerResponse =
            self.query(&QueryRequest::Custom(HubQuery::ValidatorPower {
                validator: validator.to_string(),
            }))?;
        Ok(res.power)
    }

    fn total_power(&self) -> StdResult<u64> {
        let res: TotalPowerResponse = self.query(&QueryRequest::Custom(HubQuery::TotalPower {}))?;
        Ok(res.power)
    }

    fn bonded_validators(&self) -> StdResult<Vec<BondedValidator>> {
        let res: BondedValidatorsResponse =
            self.query(&QueryRequest::Custom(HubQuery::BondedValidators {}))?;
        Ok(res.validators)
    }
}

/// In-memory power table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PowerTable {
    powers: BTreeMap<String, u64>,
}

impl PowerTable {
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (S, u64)>) -> Self {
        Self {
            powers: entries
                .into_iter()
                .map(|(validator, power)| (validator.into(), power))
                .collect(),
        }
    }

    pub fn set(&mut self, validator: impl Into<String>, power: u64) {
        self.powers.insert(validator.into(), power);
    }

    pub fn remove(&mut self, validator: &str) {
        self.powers.remove(validator);
    }
}

impl VotingPowerOracle for PowerTable {
    fn power_of(&self, validator: &str) -> StdResult<Option<u64>> {
        Ok(self.powers.get(validator).copied())
    }

    fn total_power(&self) -> StdResult<u64> {
        Ok(self.powers.values().sum())
    }

    fn bonded_validators(&self) -> StdResult<Vec<BondedValidator>> {
        Ok(self
            .powers
            .iter()
            .map(|(validator, power)| BondedValidator {
                validator: validator.clone(),
                power: *power,
            })
            .collect())
    }
}
