use anyhow::{bail, Result as AnyResult};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::cmp::max;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use cosmwasm_std::testing::{MockApi, MockQuerier, MockStorage};
use cosmwasm_std::Order::Ascending;
use cosmwasm_std::{
    to_json_binary, Addr, Api, Binary, BlockInfo, ContractResult, CustomMsg, CustomQuery, Empty,
    OwnedDeps, Querier, QuerierResult, StdResult, Storage, SystemResult, Timestamp,
};
use cw_multi_test::{
    App, AppResponse, BankKeeper, BankSudo, BasicAppBuilder, CosmosRouter, Module, WasmKeeper,
};
use cw_storage_plus::Map;

use hub_bindings::{
    BondedValidator, BondedValidatorsResponse, HubMsg, HubQuery, TotalPowerResponse,
    ValidatorPowerResponse,
};

/// How many seconds per block
/// (when we increment block.height, use this multiplier for block.time)
pub const BLOCK_TIME: u64 = 5;

pub const HUB_CHAIN_ID: &str = "hub-testnet-1";

/// Bonded validators and their voting power
const POWERS: Map<&str, u64> = Map::new("powers");
/// Jailed validators and the height they were jailed at
const JAILED: Map<&str, u64> = Map::new("jailed");

pub type HubDeps = OwnedDeps<MockStorage, MockApi, MockQuerier<HubQuery>, HubQuery>;

/// Mock dependencies answering staking queries from `powers`.
pub fn mock_deps_hub(powers: &[(&str, u64)]) -> HubDeps {
    OwnedDeps {
        storage: MockStorage::default(),
        api: MockApi::default(),
        querier: hub_querier(powers),
        custom_query_type: PhantomData,
    }
}

/// Mock querier answering staking queries from a fixed power table.
/// Replace `deps.querier` with a new one to change the powers mid-test.
pub fn hub_querier(powers: &[(&str, u64)]) -> MockQuerier<HubQuery> {
    let table: BTreeMap<String, u64> = powers
        .iter()
        .map(|(validator, power)| (validator.to_string(), *power))
        .collect();

    MockQuerier::<HubQuery>::new(&[]).with_custom_handler(move |query| {
        let res = match query {
            HubQuery::ValidatorPower { validator } => to_json_binary(&ValidatorPowerResponse {
                power: table.get(validator).copied(),
            }),
            HubQuery::TotalPower {} => to_json_binary(&TotalPowerResponse {
                power: table.values().sum(),
            }),
            HubQuery::BondedValidators {} => to_json_binary(&BondedValidatorsResponse {
                validators: table
                    .iter()
                    .map(|(validator, power)| BondedValidator {
                        validator: validator.clone(),
                        power: *power,
                    })
                    .collect(),
            }),
        };
        match res {
            Ok(bin) => SystemResult::Ok(ContractResult::Ok(bin)),
            Err(err) => SystemResult::Ok(ContractResult::Err(err.to_string())),
        }
    })
}

/// Staking and minting side of the hub chain.
pub struct HubModule {}

impl HubModule {
    /// Bonds `validator` with `power`. Zero power unbonds it.
    pub fn set_power(&self, storage: &mut dyn Storage, validator: &str, power: u64) -> StdResult<()> {
        if power == 0 {
            POWERS.remove(storage, validator);
            Ok(())
        } else {
            POWERS.save(storage, validator, &power)
        }
    }

    pub fn powers(&self, storage: &dyn Storage) -> StdResult<Vec<(String, u64)>> {
        POWERS.range(storage, None, None, Ascending).collect()
    }

    pub fn jailed(&self, storage: &dyn Storage) -> StdResult<Vec<String>> {
        JAILED.keys(storage, None, None, Ascending).collect()
    }
}

impl Module for HubModule {
    type ExecT = HubMsg;
    type QueryT = HubQuery;
    type SudoT = Empty;

    fn execute<ExecC, QueryC>(
        &self,
        api: &dyn Api,
        storage: &mut dyn Storage,
        router: &dyn CosmosRouter<ExecC = ExecC, QueryC = QueryC>,
        block: &BlockInfo,
        _sender: Addr,
        msg: HubMsg,
    ) -> AnyResult<AppResponse>
    where
        ExecC: Debug + Clone + PartialEq + JsonSchema + DeserializeOwned + CustomMsg,
        QueryC: CustomQuery + DeserializeOwned + 'static,
    {
        match msg {
            HubMsg::MintTokens { amount, recipient } => {
                let mint_msg = BankSudo::Mint {
                    to_address: recipient,
                    amount: vec![amount],
                };
                router.sudo(api, storage, block, mint_msg.into())?;
                Ok(AppResponse::default())
            }
            HubMsg::JailValidator { validator } => {
                // A jailed validator leaves the bonded set
                POWERS.remove(storage, &validator);
                JAILED.save(storage, &validator, &block.height)?;
                Ok(AppResponse::default())
            }
        }
    }

    fn query(
        &self,
        _api: &dyn Api,
        storage: &dyn Storage,
        _querier: &dyn Querier,
        _block: &BlockInfo,
        request: HubQuery,
    ) -> AnyResult<Binary> {
        let res = match request {
            HubQuery::ValidatorPower { validator } => to_json_binary(&ValidatorPowerResponse {
                power: POWERS.may_load(storage, &validator)?,
            })?,
            HubQuery::TotalPower {} => {
                let power = POWERS
                    .range(storage, None, None, Ascending)
                    .map(|item| item.map(|(_, power)| power))
                    .sum::<StdResult<u64>>()?;
                to_json_binary(&TotalPowerResponse { power })?
            }
            HubQuery::BondedValidators {} => {
                let validators = self
                    .powers(storage)?
                    .into_iter()
                    .map(|(validator, power)| BondedValidator { validator, power })
                    .collect();
                to_json_binary(&BondedValidatorsResponse { validators })?
            }
        };
        Ok(res)
    }

    fn sudo<ExecC, QueryC>(
        &self,
        _api: &dyn Api,
        _storage: &mut dyn Storage,
        _router: &dyn CosmosRouter<ExecC = ExecC, QueryC = QueryC>,
        _block: &BlockInfo,
        _msg: Self::SudoT,
    ) -> AnyResult<AppResponse>
    where
        ExecC: Debug + Clone + PartialEq + JsonSchema + DeserializeOwned + 'static,
        QueryC: CustomQuery + DeserializeOwned + 'static,
    {
        bail!("sudo not implemented for HubModule")
    }
}

pub type HubAppWrapped =
    App<BankKeeper, MockApi, MockStorage, HubModule, WasmKeeper<HubMsg, HubQuery>>;

pub struct HubApp(HubAppWrapped);

impl Deref for HubApp {
    type Target = HubAppWrapped;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for HubApp {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Querier for HubApp {
    fn raw_query(&self, bin_request: &[u8]) -> QuerierResult {
        self.0.raw_query(bin_request)
    }
}

impl Default for HubApp {
    fn default() -> Self {
        Self::new_at_height(1)
    }
}

impl HubApp {
    pub fn new_at_height(height: u64) -> Self {
        let block_info = BlockInfo {
            height,
            time: Timestamp::from_seconds(1714119228),
            chain_id: HUB_CHAIN_ID.to_owned(),
        };

        Self(
            BasicAppBuilder::<HubMsg, HubQuery>::new_custom()
                .with_custom(HubModule {})
                .with_block(block_info)
                .build(|_, _, _| {}),
        )
    }

    pub fn block_info(&self) -> BlockInfo {
        self.0.block_info()
    }

    /// Sets the voting power of `validator`. Zero unbonds it.
    pub fn set_power(&mut self, validator: &Addr, power: u64) {
        self.0
            .init_modules(|router, _, storage| {
                router.custom.set_power(storage, validator.as_str(), power)
            })
            .unwrap();
    }

    pub fn jailed(&self) -> Vec<String> {
        self.0
            .read_module(|router, _, storage| router.custom.jailed(storage))
            .unwrap()
    }

    /// This advances BlockInfo by given number of blocks.
    /// It does not do any callbacks, but keeps the ratio of seconds/block
    pub fn advance_blocks(&mut self, blocks: u64) {
        self.update_block(|block| {
            block.time = block.time.plus_seconds(BLOCK_TIME * blocks);
            block.height += blocks;
        });
    }

    /// This advances BlockInfo by given number of seconds.
    /// It does not do any callbacks, but keeps the ratio of seconds/block
    pub fn advance_seconds(&mut self, seconds: u64) {
        self.update_block(|block| {
            block.time = block.time.plus_seconds(seconds);
            block.height += max(1, seconds / BLOCK_TIME);
        });
    }
}
