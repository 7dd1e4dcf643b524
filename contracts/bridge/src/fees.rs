//! Fee economics.
//!
//! Oracle prices are fixed point with 18 decimals. A coin price is the value of one whole token
//! in the common unit, the gas price is in gwei. Every division floors, except the minimal fee
//! estimates which round up.

use cosmwasm_std::{Addr, QuerierWrapper, Uint128, Uint256};

use hub_apis::bridge_api::BridgedCoin;
use hub_bindings::HubQuery;
use hub_oracle::msg::{PriceResponse, QueryMsg as OracleQueryMsg};

use crate::contract::encode_smart_query;
use crate::error::ContractError;
use crate::msg::FeeEstimateResponse;
use crate::state::config::Config;

const PRICE_PRECISION: u128 = 1_000_000_000_000_000_000;
const GWEI_PER_TOKEN: u128 = 1_000_000_000;

/// Read access to published prices.
pub trait PriceSource {
    fn price(&self, name: &str) -> Result<Uint128, ContractError>;
}

/// Prices published by the oracle contract.
pub struct OraclePrices<'a> {
    querier: &'a QuerierWrapper<'a, HubQuery>,
    oracle: Option<&'a Addr>,
}

impl<'a> OraclePrices<'a> {
    pub fn new(querier: &'a QuerierWrapper<'a, HubQuery>, oracle: Option<&'a Addr>) -> Self {
        Self { querier, oracle }
    }
}

impl PriceSource for OraclePrices<'_> {
    fn price(&self, name: &str) -> Result<Uint128, ContractError> {
        let oracle = self.oracle.ok_or(ContractError::OracleNotSet)?;
        let query = encode_smart_query(
            oracle,
            &OracleQueryMsg::Price {
                name: name.to_string(),
            },
        )?;
        let res: Option<PriceResponse> = self.querier.query(&query)?;
        match res {
            Some(price) if !price.value.is_zero() => Ok(price.value),
            _ => Err(ContractError::PriceNotFound(name.to_string())),
        }
    }
}

fn token_unit(decimals: u32) -> Result<Uint256, ContractError> {
    Ok(Uint256::from(10u8).checked_pow(decimals)?)
}

/// Value of `amount` base units of `coin` in the common unit.
pub fn value_of(
    prices: &dyn PriceSource,
    coin: &BridgedCoin,
    amount: Uint128,
) -> Result<Uint256, ContractError> {
    let price = prices.price(&coin.price_name)?;
    let value = Uint256::from(amount).checked_mul(Uint256::from(price))?;
    Ok(value.checked_div(token_unit(coin.decimals)?)?)
}

/// Cost of `gas` on the external chain in the common unit.
pub fn gas_cost(prices: &dyn PriceSource, cfg: &Config, gas: u64) -> Result<Uint256, ContractError> {
    let gas_price = prices.price(&cfg.gas_price_name)?;
    let native_price = prices.price(&cfg.native_price_name)?;
    let cost = Uint256::from(gas)
        .checked_mul(Uint256::from(gas_price))?
        .checked_mul(Uint256::from(native_price))?;
    let unit = Uint256::from(GWEI_PER_TOKEN).checked_mul(Uint256::from(PRICE_PRECISION))?;
    Ok(cost.checked_div(unit)?)
}

/// Smallest fee in base units of `coin` whose value covers `cost`.
fn min_fee(
    prices: &dyn PriceSource,
    coin: &BridgedCoin,
    cost: Uint256,
) -> Result<Uint128, ContractError> {
    let price = Uint256::from(prices.price(&coin.price_name)?);
    let scaled = cost.checked_mul(token_unit(coin.decimals)?)?;
    let fee = scaled
        .checked_add(price)?
        .checked_sub(Uint256::one())?
        .checked_div(price)?;
    Ok(Uint128::try_from(fee)?)
}

/// Checks that `fee` pays for a single withdrawal of `coin`.
pub fn ensure_withdraw_fee(
    prices: &dyn PriceSource,
    cfg: &Config,
    coin: &BridgedCoin,
    fee: Uint128,
) -> Result<(), ContractError> {
    let value = value_of(prices, coin, fee)?;
    let cost = gas_cost(prices, cfg, cfg.min_single_withdraw_gas)?;
    if value < cost {
        return Err(ContractError::InsufficientFee { value, cost });
    }
    Ok(())
}

/// Checks that `fees` pay for a batch of `tx_count` withdrawals of `coin`.
pub fn ensure_batch_fees(
    prices: &dyn PriceSource,
    cfg: &Config,
    coin: &BridgedCoin,
    fees: Uint128,
    tx_count: u64,
) -> Result<(), ContractError> {
    let value = value_of(prices, coin, fees)?;
    let cost = gas_cost(prices, cfg, cfg.batch_gas(tx_count))?;
    if value < cost {
        return Err(ContractError::InsufficientGas { fees: value, cost });
    }
    Ok(())
}

pub fn estimate(
    prices: &dyn PriceSource,
    cfg: &Config,
    coin: &BridgedCoin,
) -> Result<FeeEstimateResponse, ContractError> {
    let withdraw_cost = gas_cost(prices, cfg, cfg.min_single_withdraw_gas)?;
    let batch_cost = gas_cost(prices, cfg, cfg.batch_gas(1))?;
    Ok(FeeEstimateResponse {
        denom: coin.denom.clone(),
        min_withdraw_fee: min_fee(prices, coin, withdraw_cost)?,
        min_batch_fee: min_fee(prices, coin, batch_cost)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{eth_coin, FixedPrices};

    const ETH: u128 = PRICE_PRECISION;

    fn prices() -> FixedPrices {
        // eth at 2000, gas at 20 gwei, usdt at 1
        FixedPrices::new(&[
            ("eth/0", 2_000 * ETH),
            ("eth/gas", 20 * ETH),
            ("usdt/0", ETH),
        ])
    }

    fn usdt() -> BridgedCoin {
        BridgedCoin {
            denom: "hub/usdt".to_string(),
            external_id: "0xdac17f958d2ee523a2206206994597c13d831ec7".to_string(),
            decimals: 6,
            price_name: "usdt/0".to_string(),
            commission: None,
        }
    }

    #[test]
    fn values_are_scaled_by_decimals() {
        let prices = prices();
        // 1.5 eth
        let value = value_of(&prices, &eth_coin(), Uint128::new(1_500_000_000_000_000_000)).unwrap();
        assert_eq!(value, Uint256::from(3_000 * ETH));
        // 2.5 usdt
        let value = value_of(&prices, &usdt(), Uint128::new(2_500_000)).unwrap();
        assert_eq!(value, Uint256::from(2 * ETH + ETH / 2));
    }

    #[test]
    fn gas_cost_in_common_unit() {
        let cfg = Config::default();
        // 50 000 gas * 20 gwei = 0.001 eth = 2 at 2000
        let cost = gas_cost(&prices(), &cfg, 50_000).unwrap();
        assert_eq!(cost, Uint256::from(2 * ETH));
    }

    #[test]
    fn withdraw_fee_must_cover_a_single_withdrawal() {
        let cfg = Config::default();
        let prices = prices();
        ensure_withdraw_fee(&prices, &cfg, &usdt(), Uint128::new(2_000_000)).unwrap();

        let err = ensure_withdraw_fee(&prices, &cfg, &usdt(), Uint128::new(1_999_999)).unwrap_err();
        assert_eq!(
            err,
            ContractError::InsufficientFee {
                value: Uint256::from(1_999_999_000_000_000_000u128),
                cost: Uint256::from(2 * ETH),
            }
        );
    }

    #[test]
    fn batch_cost_grows_with_size() {
        let cfg = Config {
            batch_gas_per_tx: 10_000,
            ..Default::default()
        };
        let prices = prices();
        // 100 000 + 2 * 10 000 gas = 4.8 usdt
        ensure_batch_fees(&prices, &cfg, &usdt(), Uint128::new(4_800_000), 2).unwrap();
        let err = ensure_batch_fees(&prices, &cfg, &usdt(), Uint128::new(4_800_000), 3).unwrap_err();
        assert!(matches!(err, ContractError::InsufficientGas { .. }));
    }

    #[test]
    fn missing_prices_are_reported() {
        let prices = FixedPrices::new(&[("eth/0", 2_000 * ETH)]);
        let err = gas_cost(&prices, &Config::default(), 1).unwrap_err();
        assert_eq!(err, ContractError::PriceNotFound("eth/gas".to_string()));
    }

    #[test]
    fn estimates_round_up() {
        let cfg = Config::default();
        let prices = FixedPrices::new(&[
            ("eth/0", 2_000 * ETH),
            ("eth/gas", 20 * ETH),
            ("usdt/0", 3 * ETH),
        ]);
        let estimate = estimate(&prices, &cfg, &usdt()).unwrap();
        // 2 / 3 usdt and 4 / 3 usdt, rounded up to the base unit
        assert_eq!(estimate.min_withdraw_fee, Uint128::new(666_667));
        assert_eq!(estimate.min_batch_fee, Uint128::new(1_333_334));
    }
}
