use std::collections::BTreeMap;

use cosmwasm_std::testing::{mock_env, MockApi};
use cosmwasm_std::{Addr, Binary, Env, Uint128};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{Signature, SigningKey};

use hub_apis::bridge_api::BridgedCoin;
use hub_attestation::PowerTable;

use crate::dispatch::BridgeContext;
use crate::error::ContractError;
use crate::fees::PriceSource;
use crate::state::config::Config;

pub(crate) const ETH_DENOM: &str = "hub/eth";
pub(crate) const ETH_EXTERNAL_ID: &str = "0x0000000000000000000000000000000000000000";
/// One whole token with 18 decimals
pub(crate) const ONE: u128 = 1_000_000_000_000_000_000;

/// Price table standing in for the oracle contract.
#[derive(Default)]
pub(crate) struct FixedPrices {
    prices: BTreeMap<String, Uint128>,
}

impl FixedPrices {
    pub fn new(prices: &[(&str, u128)]) -> Self {
        Self {
            prices: prices
                .iter()
                .map(|(name, value)| (name.to_string(), Uint128::new(*value)))
                .collect(),
        }
    }

    /// eth at 2000 and free gas: any fee pays for any withdrawal.
    pub fn cheap_gas() -> Self {
        Self::new(&[("eth/0", 2_000 * ONE), ("eth/gas", 0)])
    }
}

impl PriceSource for FixedPrices {
    fn price(&self, name: &str) -> Result<Uint128, ContractError> {
        self.prices
            .get(name)
            .copied()
            .ok_or_else(|| ContractError::PriceNotFound(name.to_string()))
    }
}

pub(crate) fn eth_coin() -> BridgedCoin {
    BridgedCoin {
        denom: ETH_DENOM.to_string(),
        external_id: ETH_EXTERNAL_ID.to_string(),
        decimals: 18,
        price_name: "eth/0".to_string(),
        commission: None,
    }
}

pub(crate) fn test_config() -> Config {
    Config {
        bridge_contract: "0x8858eeb3dfffa017d4bce9801d340d36cf895ccf".to_string(),
        bridge_chain_id: 1,
        coins: vec![eth_coin()],
        ..Default::default()
    }
}

/// Deterministic secp256k1 key, `seed` must be non-zero.
pub(crate) fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_slice(&[seed; 32]).unwrap()
}

/// Compressed SEC1 public key.
pub(crate) fn pubkey(key: &SigningKey) -> Binary {
    Binary::from(key.verifying_key().to_encoded_point(true).as_bytes())
}

/// External address controlled by `key`.
pub(crate) fn external_address(key: &SigningKey) -> String {
    crate::confirms::external_address_of(&pubkey(key)).unwrap()
}

pub(crate) fn sign(key: &SigningKey, digest: &[u8; 32]) -> Binary {
    let signature: Signature = key.sign_prehash(digest).unwrap();
    Binary::from(signature.to_bytes().as_slice())
}

/// Everything a bridge operation reads besides storage, owned by the test.
pub(crate) struct TestContext {
    pub api: MockApi,
    pub env: Env,
    pub config: Config,
    pub powers: PowerTable,
    pub prices: FixedPrices,
}

impl TestContext {
    pub fn new(validators: &[(&str, u64)]) -> Self {
        let api = MockApi::default();
        let powers = PowerTable::new(
            validators
                .iter()
                .map(|(name, power)| (api.addr_make(name).to_string(), *power)),
        );
        Self {
            api,
            env: mock_env(),
            config: test_config(),
            powers,
            prices: FixedPrices::cheap_gas(),
        }
    }

    pub fn addr(&self, name: &str) -> Addr {
        self.api.addr_make(name)
    }

    pub fn ctx(&self) -> BridgeContext<'_> {
        BridgeContext {
            api: &self.api,
            env: &self.env,
            config: &self.config,
            powers: &self.powers,
            prices: &self.prices,
        }
    }
}
