use anyhow::Result as AnyResult;
use cosmwasm_std::{coins, Addr, Binary, Uint128};
use cw_multi_test::{AppResponse, Contract, ContractWrapper, Executor};
use k256::ecdsa::SigningKey;

use hub_apis::bridge_api::BridgeClaim;
use hub_apis::oracle_api::Price;
use hub_apis::SudoMsg;
use hub_bindings::{HubMsg, HubQuery};
use hub_bindings_test::HubApp;

use crate::error::ContractError;
use crate::msg::{
    CheckpointResponse, ExecuteMsg, InstantiateMsg, PoolResponse, QueryMsg, ValsetsResponse,
};
use crate::state::batch::OutgoingTxBatch;
use crate::state::config::Config;
use crate::state::status::TxStatusRecord;
use crate::test_utils::{eth_coin, external_address, pubkey, sign, signing_key, ETH_DENOM};

const BRIDGE_CONTRACT: &str = "0x8858eeb3dfffa017d4bce9801d340d36cf895ccf";

fn contract_bridge() -> Box<dyn Contract<HubMsg, HubQuery>> {
    let contract = ContractWrapper::new(crate::execute, crate::instantiate, crate::query)
        .with_migrate(crate::migrate)
        .with_sudo(crate::sudo);
    Box::new(contract)
}

fn contract_oracle() -> Box<dyn Contract<HubMsg, HubQuery>> {
    let contract = ContractWrapper::new(
        hub_oracle::execute,
        hub_oracle::instantiate,
        hub_oracle::query,
    )
    .with_sudo(hub_oracle::sudo);
    Box::new(contract)
}

pub struct SuiteBuilder {
    validators: Vec<(&'static str, u64)>,
    signed_valsets_window: Option<u64>,
}

impl SuiteBuilder {
    pub fn new() -> Self {
        Self {
            validators: vec![("val1", 40), ("val2", 30), ("val3", 20), ("val4", 10)],
            signed_valsets_window: None,
        }
    }

    pub fn with_signed_valsets_window(mut self, window: u64) -> Self {
        self.signed_valsets_window = Some(window);
        self
    }

    #[track_caller]
    pub fn build(self) -> Suite {
        let mut app = HubApp::default();
        let owner = app.api().addr_make("owner");

        let validators: Vec<Addr> = self
            .validators
            .iter()
            .map(|(name, _)| app.api().addr_make(name))
            .collect();
        for (addr, (_, power)) in validators.iter().zip(&self.validators) {
            app.set_power(addr, *power);
        }

        let oracle_code_id = app.store_code(contract_oracle());
        let bridge_code_id = app.store_code(contract_bridge());

        let oracle = app
            .instantiate_contract(
                oracle_code_id,
                owner.clone(),
                &hub_apis::oracle_api::InstantiateMsg {
                    admin: Some(owner.to_string()),
                    ..Default::default()
                },
                &[],
                "oracle",
                Some(owner.to_string()),
            )
            .unwrap();

        let bridge = app
            .instantiate_contract(
                bridge_code_id,
                owner.clone(),
                &InstantiateMsg {
                    admin: Some(owner.to_string()),
                    oracle: Some(oracle.to_string()),
                    bridge_contract: BRIDGE_CONTRACT.to_string(),
                    bridge_chain_id: 1,
                    coins: vec![eth_coin()],
                    signed_valsets_window: self.signed_valsets_window,
                    ..Default::default()
                },
                &[],
                "bridge",
                Some(owner.to_string()),
            )
            .unwrap();

        Suite {
            app,
            owner,
            bridge,
            oracle,
            validators,
            event_nonces: vec![0; self.validators.len()],
        }
    }
}

pub struct Suite {
    pub app: HubApp,
    pub owner: Addr,
    pub bridge: Addr,
    pub oracle: Addr,
    /// Validator accounts, in the order they were configured
    pub validators: Vec<Addr>,
    /// Last event nonce each validator submitted
    event_nonces: Vec<u64>,
}

impl Suite {
    pub fn addr(&self, name: &str) -> Addr {
        self.app.api().addr_make(name)
    }

    /// Key validator `index` signs checkpoints with.
    pub fn signer(&self, index: usize) -> SigningKey {
        signing_key(index as u8 + 1)
    }

    pub fn end_block(&mut self) -> AnyResult<AppResponse> {
        self.app.wasm_sudo(self.oracle.clone(), &SudoMsg::EndBlock {})?;
        self.app.wasm_sudo(self.bridge.clone(), &SudoMsg::EndBlock {})
    }

    /// Every validator submits `prices`, then the epoch closes.
    #[track_caller]
    pub fn publish_prices(&mut self, prices: &[(&str, u128)]) {
        let current: hub_oracle::msg::EpochResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                self.oracle.clone(),
                &hub_oracle::msg::QueryMsg::CurrentEpoch {},
            )
            .unwrap();
        let prices: Vec<Price> = prices
            .iter()
            .map(|(name, value)| Price {
                name: name.to_string(),
                value: Uint128::new(*value),
            })
            .collect();
        for validator in self.validators.clone() {
            self.app
                .execute_contract(
                    validator,
                    self.oracle.clone(),
                    &hub_apis::oracle_api::ExecuteMsg::SubmitPrices {
                        epoch: current.epoch,
                        prices: prices.clone(),
                    },
                    &[],
                )
                .unwrap();
        }
        // close the epoch at the next boundary
        let height = self.app.block_info().height;
        let boundary = (height / current.epoch_length + 1) * current.epoch_length;
        self.app.advance_blocks(boundary - height);
        self.end_block().unwrap();
    }

    /// Validator `index` attests to `claim` as its next event.
    pub fn submit_claim(
        &mut self,
        index: usize,
        claim: &BridgeClaim,
    ) -> Result<AppResponse, ContractError> {
        let event_nonce = self.event_nonces[index] + 1;
        let res = self
            .app
            .execute_contract(
                self.validators[index].clone(),
                self.bridge.clone(),
                &ExecuteMsg::SubmitClaim {
                    event_nonce,
                    claim: claim.clone(),
                },
                &[],
            )
            .map_err(|err| err.downcast::<ContractError>().unwrap())?;
        self.event_nonces[index] = event_nonce;
        Ok(res)
    }

    #[track_caller]
    pub fn register_signers(&mut self) {
        for index in 0..self.validators.len() {
            let validator = self.validators[index].clone();
            let key = self.signer(index);
            let msg = ExecuteMsg::SetSignerKey {
                external_address: external_address(&key),
                pubkey: pubkey(&key),
            };
            self.app
                .execute_contract(validator, self.bridge.clone(), &msg, &[])
                .unwrap();
        }
    }

    pub fn confirm_valset(
        &mut self,
        index: usize,
        nonce: u64,
    ) -> Result<AppResponse, ContractError> {
        let checkpoint: CheckpointResponse = self
            .app
            .wrap()
            .query_wasm_smart(self.bridge.clone(), &QueryMsg::ValsetCheckpoint { nonce })
            .map_err(ContractError::Std)?;
        let signature = self.sign(index, &checkpoint.checkpoint);
        self.app
            .execute_contract(
                self.validators[index].clone(),
                self.bridge.clone(),
                &ExecuteMsg::SubmitValsetConfirm { nonce, signature },
                &[],
            )
            .map_err(|err| err.downcast::<ContractError>().unwrap())
    }

    pub fn confirm_batch(
        &mut self,
        index: usize,
        nonce: u64,
    ) -> Result<AppResponse, ContractError> {
        let checkpoint: CheckpointResponse = self
            .app
            .wrap()
            .query_wasm_smart(self.bridge.clone(), &QueryMsg::BatchCheckpoint { nonce })
            .map_err(ContractError::Std)?;
        let signature = self.sign(index, &checkpoint.checkpoint);
        self.app
            .execute_contract(
                self.validators[index].clone(),
                self.bridge.clone(),
                &ExecuteMsg::SubmitBatchConfirm { nonce, signature },
                &[],
            )
            .map_err(|err| err.downcast::<ContractError>().unwrap())
    }

    fn sign(&self, index: usize, checkpoint: &Binary) -> Binary {
        let digest: [u8; 32] = checkpoint.as_slice().try_into().unwrap();
        sign(&self.signer(index), &digest)
    }

    pub fn send_to_external(
        &mut self,
        sender: &Addr,
        amount: u128,
        fee: u128,
        destination: &str,
    ) -> Result<AppResponse, ContractError> {
        self.app
            .execute_contract(
                sender.clone(),
                self.bridge.clone(),
                &ExecuteMsg::SendToExternal {
                    destination: destination.to_string(),
                    fee: Uint128::new(fee),
                },
                &coins(amount, ETH_DENOM),
            )
            .map_err(|err| err.downcast::<ContractError>().unwrap())
    }

    pub fn balance(&self, addr: &Addr) -> u128 {
        self.app
            .wrap()
            .query_balance(addr, ETH_DENOM)
            .unwrap()
            .amount
            .u128()
    }

    #[track_caller]
    pub fn get_config(&self) -> Config {
        self.app
            .wrap()
            .query_wasm_smart(self.bridge.clone(), &QueryMsg::Config {})
            .unwrap()
    }

    #[track_caller]
    pub fn get_pending_valsets(&self, index: usize) -> ValsetsResponse {
        self.app
            .wrap()
            .query_wasm_smart(
                self.bridge.clone(),
                &QueryMsg::PendingValsets {
                    validator: self.validators[index].to_string(),
                },
            )
            .unwrap()
    }

    #[track_caller]
    pub fn get_pending_batch(&self, index: usize) -> Option<OutgoingTxBatch> {
        self.app
            .wrap()
            .query_wasm_smart(
                self.bridge.clone(),
                &QueryMsg::PendingBatch {
                    validator: self.validators[index].to_string(),
                },
            )
            .unwrap()
    }

    #[track_caller]
    pub fn get_outgoing_pool(&self) -> PoolResponse {
        self.app
            .wrap()
            .query_wasm_smart(
                self.bridge.clone(),
                &QueryMsg::OutgoingPool {
                    denom: ETH_DENOM.to_string(),
                    limit: None,
                },
            )
            .unwrap()
    }

    #[track_caller]
    pub fn get_tx_status(&self, tx_hash: &str) -> Option<TxStatusRecord> {
        self.app
            .wrap()
            .query_wasm_smart(
                self.bridge.clone(),
                &QueryMsg::TxStatus {
                    tx_hash: tx_hash.to_string(),
                },
            )
            .unwrap()
    }
}
