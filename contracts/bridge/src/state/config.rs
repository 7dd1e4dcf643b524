use std::collections::BTreeSet;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal, Uint128};
use cw_controllers::Admin;
use cw_storage_plus::Item;
use derivative::Derivative;

use hub_apis::bridge_api::BridgedCoin;

use crate::error::ContractError;

pub(crate) const CONFIG: Item<Config> = Item::new("config");
/// Storage for admin
pub(crate) const ADMIN: Admin = Admin::new("admin");

pub const DEFAULT_MIN_DEPOSIT: u128 = 100;
pub const DEFAULT_COMMISSION_PERCENT: u64 = 1;
pub const DEFAULT_MIN_BATCH_GAS: u64 = 100_000;
pub const DEFAULT_BATCH_GAS_PER_TX: u64 = 0;
pub const DEFAULT_MIN_SINGLE_WITHDRAW_GAS: u64 = 50_000;
pub const DEFAULT_BATCH_SIZE: u32 = 100;
/// One week
pub const DEFAULT_POOL_ENTRY_TTL: u64 = 604_800;
pub const DEFAULT_SIGNED_VALSETS_WINDOW: u64 = 10_000;
pub const DEFAULT_VALSET_DRIFT_PERCENT: u64 = 1;
pub const DEFAULT_ATTESTATION_WINDOW: u64 = 10_000;
pub const DEFAULT_NATIVE_PRICE_NAME: &str = "eth/0";
pub const DEFAULT_GAS_PRICE_NAME: &str = "eth/gas";

/// Config are the bridge contract parameters
#[cw_serde]
#[derive(Derivative)]
#[derivative(Default)]
pub struct Config {
    /// Price oracle contract
    pub oracle: Option<Addr>,
    /// Address of the bridge contract on the external chain
    pub bridge_contract: String,
    pub bridge_chain_id: u64,
    /// Assets that can cross the bridge
    pub coins: Vec<BridgedCoin>,
    /// Deposits below this amount are rejected
    #[derivative(Default(value = "Uint128::new(DEFAULT_MIN_DEPOSIT)"))]
    pub min_deposit: Uint128,
    /// Deposit commission of assets without their own
    #[derivative(Default(value = "Decimal::percent(DEFAULT_COMMISSION_PERCENT)"))]
    pub default_commission: Decimal,
    #[derivative(Default(value = "DEFAULT_MIN_BATCH_GAS"))]
    pub min_batch_gas: u64,
    #[derivative(Default(value = "DEFAULT_BATCH_GAS_PER_TX"))]
    pub batch_gas_per_tx: u64,
    #[derivative(Default(value = "DEFAULT_MIN_SINGLE_WITHDRAW_GAS"))]
    pub min_single_withdraw_gas: u64,
    /// Maximum number of withdrawals in a batch built at end block
    #[derivative(Default(value = "DEFAULT_BATCH_SIZE"))]
    pub batch_size: u32,
    /// Seconds a withdrawal waits in the pool before it is refunded
    #[derivative(Default(value = "DEFAULT_POOL_ENTRY_TTL"))]
    pub pool_entry_ttl: u64,
    /// Blocks validators have to confirm a valset before they are jailed
    #[derivative(Default(value = "DEFAULT_SIGNED_VALSETS_WINDOW"))]
    pub signed_valsets_window: u64,
    /// Power drift above which a new valset is requested
    #[derivative(Default(value = "Decimal::percent(DEFAULT_VALSET_DRIFT_PERCENT)"))]
    pub valset_drift_threshold: Decimal,
    /// Blocks attestations are kept for
    #[derivative(Default(value = "DEFAULT_ATTESTATION_WINDOW"))]
    pub attestation_window: u64,
    /// Oracle price of the external chain's native token
    #[derivative(Default(value = "DEFAULT_NATIVE_PRICE_NAME.to_string()"))]
    pub native_price_name: String,
    /// Oracle gas price of the external chain, in gwei
    #[derivative(Default(value = "DEFAULT_GAS_PRICE_NAME.to_string()"))]
    pub gas_price_name: String,
    /// Halted bridges accept no withdrawals and build no batches
    pub halted: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.bridge_contract.trim().is_empty() {
            return Err(ContractError::InvalidConfig(
                "bridge contract must be set".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ContractError::InvalidBatchSize);
        }
        if self.default_commission > Decimal::one() {
            return Err(ContractError::InvalidConfig(
                "commission cannot exceed 100%".to_string(),
            ));
        }
        if self.valset_drift_threshold > Decimal::one() {
            return Err(ContractError::InvalidConfig(
                "valset drift threshold cannot exceed 100%".to_string(),
            ));
        }

        let mut denoms = BTreeSet::new();
        let mut external_ids = BTreeSet::new();
        for coin in &self.coins {
            if coin.denom.is_empty() || coin.external_id.is_empty() {
                return Err(ContractError::InvalidConfig(
                    "coins need a denom and an external id".to_string(),
                ));
            }
            if !denoms.insert(coin.denom.as_str()) {
                return Err(ContractError::InvalidConfig(format!(
                    "denom {} is registered twice",
                    coin.denom
                )));
            }
            if !external_ids.insert(coin.external_id.as_str()) {
                return Err(ContractError::InvalidConfig(format!(
                    "external asset {} is registered twice",
                    coin.external_id
                )));
            }
            if coin.commission.is_some_and(|c| c > Decimal::one()) {
                return Err(ContractError::InvalidConfig(format!(
                    "commission of {} cannot exceed 100%",
                    coin.denom
                )));
            }
        }
        Ok(())
    }

    pub fn coin_by_external_id(&self, external_id: &str) -> Result<&BridgedCoin, ContractError> {
        self.coins
            .iter()
            .find(|coin| coin.external_id == external_id)
            .ok_or_else(|| ContractError::UnknownCoin(external_id.to_string()))
    }

    pub fn coin_by_denom(&self, denom: &str) -> Result<&BridgedCoin, ContractError> {
        self.coins
            .iter()
            .find(|coin| coin.denom == denom)
            .ok_or_else(|| ContractError::UnknownDenom(denom.to_string()))
    }

    pub fn commission_rate(&self, coin: &BridgedCoin) -> Decimal {
        coin.commission.unwrap_or(self.default_commission)
    }

    /// Gas needed to execute a batch of `tx_count` withdrawals.
    pub fn batch_gas(&self, tx_count: u64) -> u64 {
        self.min_batch_gas
            .saturating_add(self.batch_gas_per_tx.saturating_mul(tx_count))
    }
}
