use cosmwasm_logging::{debug, init_cosmwasm_logger, warn};
use cosmwasm_std::{
    attr, coin, to_json_binary, Addr, Binary, CustomQuery, Deps, DepsMut, Env, MessageInfo,
    QueryRequest, QueryResponse, Response, StdResult, Uint128, WasmQuery,
};
use cw2::{get_contract_version, set_contract_version};
use cw_utils::{maybe_addr, nonpayable, one_coin};

use hub_apis::bridge_api::{BridgeClaim, ConfigUpdate};
use hub_apis::SudoMsg;
use hub_attestation::{load_attestation, prune_attestations};
use hub_bindings::{HubMsg, HubQuery};
use hub_oracle::msg::QueryMsg as OracleQueryMsg;

use crate::dispatch::BridgeContext;
use crate::error::ContractError;
use crate::events::{outgoing_batch_event, withdraw_queued_event};
use crate::fees::{self, OraclePrices};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::outgoing::{self, NewWithdrawal};
use crate::state::batch::BATCHES;
use crate::state::config::{Config, ADMIN, CONFIG};
use crate::state::signers::SIGNERS;
use crate::state::status::TX_STATUS;
use crate::state::valset::{CURRENT_VALSET, VALSET_REQUESTS};
use crate::{claims, confirms, queries, valset};

pub const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn instantiate(
    mut deps: DepsMut<HubQuery>,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response<HubMsg>, ContractError> {
    nonpayable(&info)?;

    let defaults = Config::default();
    let config = Config {
        oracle: maybe_addr(deps.api, msg.oracle)?,
        bridge_contract: msg.bridge_contract.to_lowercase(),
        bridge_chain_id: msg.bridge_chain_id,
        coins: msg.coins,
        min_deposit: msg.min_deposit.unwrap_or(defaults.min_deposit),
        default_commission: msg
            .default_commission
            .unwrap_or(defaults.default_commission),
        min_batch_gas: msg.min_batch_gas.unwrap_or(defaults.min_batch_gas),
        batch_gas_per_tx: msg.batch_gas_per_tx.unwrap_or(defaults.batch_gas_per_tx),
        min_single_withdraw_gas: msg
            .min_single_withdraw_gas
            .unwrap_or(defaults.min_single_withdraw_gas),
        batch_size: msg.batch_size.unwrap_or(defaults.batch_size),
        pool_entry_ttl: msg.pool_entry_ttl.unwrap_or(defaults.pool_entry_ttl),
        signed_valsets_window: msg
            .signed_valsets_window
            .unwrap_or(defaults.signed_valsets_window),
        valset_drift_threshold: msg
            .valset_drift_threshold
            .unwrap_or(defaults.valset_drift_threshold),
        attestation_window: msg
            .attestation_window
            .unwrap_or(defaults.attestation_window),
        native_price_name: msg
            .native_price_name
            .unwrap_or(defaults.native_price_name),
        gas_price_name: msg.gas_price_name.unwrap_or(defaults.gas_price_name),
        halted: false,
    };
    config.validate()?;
    CONFIG.save(deps.storage, &config)?;

    let api = deps.api;
    ADMIN.set(deps.branch(), maybe_addr(api, msg.admin)?)?;

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::new().add_attribute("action", "instantiate"))
}

pub fn query(
    deps: Deps<HubQuery>,
    _env: Env,
    msg: QueryMsg,
) -> Result<QueryResponse, ContractError> {
    match msg {
        QueryMsg::Config {} => Ok(to_json_binary(&CONFIG.load(deps.storage)?)?),
        QueryMsg::Admin {} => to_json_binary(&ADMIN.query_admin(deps)?).map_err(Into::into),
        QueryMsg::CurrentValset {} => {
            Ok(to_json_binary(&CURRENT_VALSET.may_load(deps.storage)?)?)
        }
        QueryMsg::ValsetRequest { nonce } => Ok(to_json_binary(
            &VALSET_REQUESTS.may_load(deps.storage, nonce)?,
        )?),
        QueryMsg::PendingValsets { validator } => {
            Ok(to_json_binary(&queries::pending_valsets(deps, validator)?)?)
        }
        QueryMsg::ValsetConfirms {
            nonce,
            start_after,
            limit,
        } => Ok(to_json_binary(&queries::valset_confirms(
            deps,
            nonce,
            start_after,
            limit,
        )?)?),
        QueryMsg::Batch { nonce } => Ok(to_json_binary(&BATCHES.may_load(deps.storage, nonce)?)?),
        QueryMsg::Batches { start_after, limit } => {
            Ok(to_json_binary(&queries::batches(deps, start_after, limit)?)?)
        }
        QueryMsg::PendingBatch { validator } => {
            Ok(to_json_binary(&queries::pending_batch(deps, validator)?)?)
        }
        QueryMsg::BatchConfirms {
            nonce,
            start_after,
            limit,
        } => Ok(to_json_binary(&queries::batch_confirms(
            deps,
            nonce,
            start_after,
            limit,
        )?)?),
        QueryMsg::Attestation {
            event_nonce,
            claim_hash,
        } => Ok(to_json_binary(&load_attestation(
            deps.storage,
            event_nonce,
            &claim_hash,
        )?)?),
        QueryMsg::LastEventNonce { validator } => {
            Ok(to_json_binary(&queries::last_event_nonce_of(deps, validator)?)?)
        }
        QueryMsg::LastObservedNonce {} => {
            Ok(to_json_binary(&queries::last_observed_nonce(deps)?)?)
        }
        QueryMsg::OutgoingPool { denom, limit } => {
            Ok(to_json_binary(&queries::outgoing_pool(deps, denom, limit)?)?)
        }
        QueryMsg::TxStatus { tx_hash } => {
            Ok(to_json_binary(&TX_STATUS.may_load(deps.storage, &tx_hash)?)?)
        }
        QueryMsg::SignerKey { validator } => {
            Ok(to_json_binary(&SIGNERS.may_load(deps.storage, &validator)?)?)
        }
        QueryMsg::FeeEstimate { denom } => {
            Ok(to_json_binary(&queries::fee_estimate(deps, denom)?)?)
        }
        QueryMsg::ValsetCheckpoint { nonce } => {
            Ok(to_json_binary(&queries::valset_checkpoint_of(deps, nonce)?)?)
        }
        QueryMsg::BatchCheckpoint { nonce } => {
            Ok(to_json_binary(&queries::batch_checkpoint_of(deps, nonce)?)?)
        }
    }
}

pub fn migrate(
    deps: DepsMut<HubQuery>,
    _env: Env,
    _msg: MigrateMsg,
) -> Result<Response<HubMsg>, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::WrongContract(stored.contract));
    }
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::new().add_attribute("action", "migrate"))
}

pub fn execute(
    deps: DepsMut<HubQuery>,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response<HubMsg>, ContractError> {
    init_cosmwasm_logger(deps.api);
    let api = deps.api;
    match msg {
        ExecuteMsg::UpdateAdmin { admin } => ADMIN
            .execute_update_admin(deps, info, maybe_addr(api, admin)?)
            .map_err(Into::into),
        ExecuteMsg::UpdateConfig(update) => handle_update_config(deps, info, update),
        ExecuteMsg::SetHalted { halted } => handle_set_halted(deps, info, halted),
        ExecuteMsg::SetSignerKey {
            external_address,
            pubkey,
        } => handle_set_signer_key(deps, info, external_address, pubkey),
        ExecuteMsg::SubmitClaim { event_nonce, claim } => {
            handle_submit_claim(deps, env, info, event_nonce, claim)
        }
        ExecuteMsg::SubmitValsetConfirm { nonce, signature } => {
            handle_confirm(deps, env, info, Checkpoint::Valset, nonce, signature)
        }
        ExecuteMsg::SubmitBatchConfirm { nonce, signature } => {
            handle_confirm(deps, env, info, Checkpoint::Batch, nonce, signature)
        }
        ExecuteMsg::SendToExternal { destination, fee } => {
            handle_send_to_external(deps, env, info, destination, fee)
        }
        ExecuteMsg::RequestBatch { denom, max_size } => {
            handle_request_batch(deps, env, info, denom, max_size)
        }
        ExecuteMsg::CancelBatch { nonce } => handle_cancel_batch(deps, info, nonce),
    }
}

pub fn sudo(
    deps: DepsMut<HubQuery>,
    env: Env,
    msg: SudoMsg,
) -> Result<Response<HubMsg>, ContractError> {
    init_cosmwasm_logger(deps.api);
    match msg {
        SudoMsg::EndBlock {} => handle_end_block(deps, env),
    }
}

/// Smart query to another contract, typed for the hub querier.
pub(crate) fn encode_smart_query<Q: CustomQuery>(
    addr: &Addr,
    msg: &OracleQueryMsg,
) -> StdResult<QueryRequest<Q>> {
    Ok(WasmQuery::Smart {
        contract_addr: addr.to_string(),
        msg: to_json_binary(msg)?,
    }
    .into())
}

fn handle_update_config(
    deps: DepsMut<HubQuery>,
    info: MessageInfo,
    update: ConfigUpdate,
) -> Result<Response<HubMsg>, ContractError> {
    nonpayable(&info)?;
    ADMIN.assert_admin(deps.as_ref(), &info.sender)?;

    let mut cfg = CONFIG.load(deps.storage)?;
    let mut attributes = vec![
        attr("action", "update_config"),
        attr("sender", info.sender),
    ];
    if let Some(oracle) = update.oracle {
        let oracle = deps.api.addr_validate(&oracle)?;
        attributes.push(attr("oracle", oracle.as_str()));
        cfg.oracle = Some(oracle);
    }
    if let Some(coins) = update.coins {
        let denoms: Vec<&str> = coins.iter().map(|c| c.denom.as_str()).collect();
        attributes.push(attr("coins", denoms.join(",")));
        cfg.coins = coins;
    }
    if let Some(min_deposit) = update.min_deposit {
        cfg.min_deposit = min_deposit;
        attributes.push(attr("min_deposit", min_deposit.to_string()));
    }
    if let Some(default_commission) = update.default_commission {
        cfg.default_commission = default_commission;
        attributes.push(attr("default_commission", default_commission.to_string()));
    }
    if let Some(min_batch_gas) = update.min_batch_gas {
        cfg.min_batch_gas = min_batch_gas;
        attributes.push(attr("min_batch_gas", min_batch_gas.to_string()));
    }
    if let Some(batch_gas_per_tx) = update.batch_gas_per_tx {
        cfg.batch_gas_per_tx = batch_gas_per_tx;
        attributes.push(attr("batch_gas_per_tx", batch_gas_per_tx.to_string()));
    }
    if let Some(gas) = update.min_single_withdraw_gas {
        cfg.min_single_withdraw_gas = gas;
        attributes.push(attr("min_single_withdraw_gas", gas.to_string()));
    }
    if let Some(batch_size) = update.batch_size {
        cfg.batch_size = batch_size;
        attributes.push(attr("batch_size", batch_size.to_string()));
    }
    if let Some(ttl) = update.pool_entry_ttl {
        cfg.pool_entry_ttl = ttl;
        attributes.push(attr("pool_entry_ttl", ttl.to_string()));
    }
    if let Some(window) = update.signed_valsets_window {
        cfg.signed_valsets_window = window;
        attributes.push(attr("signed_valsets_window", window.to_string()));
    }
    if let Some(threshold) = update.valset_drift_threshold {
        cfg.valset_drift_threshold = threshold;
        attributes.push(attr("valset_drift_threshold", threshold.to_string()));
    }
    if let Some(window) = update.attestation_window {
        cfg.attestation_window = window;
        attributes.push(attr("attestation_window", window.to_string()));
    }
    cfg.validate()?;
    CONFIG.save(deps.storage, &cfg)?;

    Ok(Response::new().add_attributes(attributes))
}

fn handle_set_halted(
    deps: DepsMut<HubQuery>,
    info: MessageInfo,
    halted: bool,
) -> Result<Response<HubMsg>, ContractError> {
    nonpayable(&info)?;
    ADMIN.assert_admin(deps.as_ref(), &info.sender)?;

    CONFIG.update(deps.storage, |mut cfg| -> StdResult<_> {
        cfg.halted = halted;
        Ok(cfg)
    })?;
    Ok(Response::new()
        .add_attribute("action", "set_halted")
        .add_attribute("halted", halted.to_string()))
}

fn handle_set_signer_key(
    deps: DepsMut<HubQuery>,
    info: MessageInfo,
    external_address: String,
    pubkey: Binary,
) -> Result<Response<HubMsg>, ContractError> {
    nonpayable(&info)?;
    let DepsMut {
        storage, querier, ..
    } = deps;
    confirms::set_signer_key(
        storage,
        &querier,
        info.sender.as_str(),
        &external_address,
        pubkey,
    )
}

fn handle_submit_claim(
    deps: DepsMut<HubQuery>,
    env: Env,
    info: MessageInfo,
    event_nonce: u64,
    claim: BridgeClaim,
) -> Result<Response<HubMsg>, ContractError> {
    nonpayable(&info)?;
    let cfg = CONFIG.load(deps.storage)?;
    let DepsMut {
        storage,
        api,
        querier,
    } = deps;
    let prices = OraclePrices::new(&querier, cfg.oracle.as_ref());
    let ctx = BridgeContext {
        api,
        env: &env,
        config: &cfg,
        powers: &querier,
        prices: &prices,
    };
    claims::submit_claim(storage, &ctx, info.sender.as_str(), event_nonce, claim)
}

#[derive(Clone, Copy)]
enum Checkpoint {
    Valset,
    Batch,
}

fn handle_confirm(
    deps: DepsMut<HubQuery>,
    env: Env,
    info: MessageInfo,
    checkpoint: Checkpoint,
    nonce: u64,
    signature: Binary,
) -> Result<Response<HubMsg>, ContractError> {
    nonpayable(&info)?;
    let cfg = CONFIG.load(deps.storage)?;
    let DepsMut {
        storage,
        api,
        querier,
    } = deps;
    let validator = info.sender.as_str();
    let height = env.block.height;
    match checkpoint {
        Checkpoint::Valset => confirms::submit_valset_confirm(
            storage, api, &querier, &cfg, validator, nonce, signature, height,
        ),
        Checkpoint::Batch => confirms::submit_batch_confirm(
            storage, api, &querier, &cfg, validator, nonce, signature, height,
        ),
    }
}

fn handle_send_to_external(
    deps: DepsMut<HubQuery>,
    env: Env,
    info: MessageInfo,
    destination: String,
    fee: Uint128,
) -> Result<Response<HubMsg>, ContractError> {
    let cfg = CONFIG.load(deps.storage)?;
    if cfg.halted {
        return Err(ContractError::BridgeHalted);
    }
    let funds = one_coin(&info)?;
    let bridged = cfg.coin_by_denom(&funds.denom)?;
    if fee >= funds.amount {
        return Err(ContractError::InvalidAmount);
    }
    let prices = OraclePrices::new(&deps.querier, cfg.oracle.as_ref());
    fees::ensure_withdraw_fee(&prices, &cfg, bridged, fee)?;

    let tx = outgoing::enqueue(
        deps.storage,
        &env,
        &cfg,
        NewWithdrawal {
            sender: info.sender,
            destination,
            amount: coin(funds.amount.checked_sub(fee)?.u128(), &funds.denom),
            fee,
            refund_address: None,
            tx_hash: None,
            expires: true,
        },
    )?;
    Ok(Response::new()
        .set_data(to_json_binary(&tx.id)?)
        .add_attribute("action", "send_to_external")
        .add_event(withdraw_queued_event(&tx)))
}

fn handle_request_batch(
    deps: DepsMut<HubQuery>,
    env: Env,
    info: MessageInfo,
    denom: String,
    max_size: Option<u32>,
) -> Result<Response<HubMsg>, ContractError> {
    nonpayable(&info)?;
    let cfg = CONFIG.load(deps.storage)?;
    let DepsMut {
        storage,
        api,
        querier,
    } = deps;
    let prices = OraclePrices::new(&querier, cfg.oracle.as_ref());
    let ctx = BridgeContext {
        api,
        env: &env,
        config: &cfg,
        powers: &querier,
        prices: &prices,
    };
    let res = outgoing::request_batch(storage, &ctx, &denom, max_size.unwrap_or(cfg.batch_size))?;
    Ok(res.add_attribute("action", "request_batch"))
}

fn handle_cancel_batch(
    deps: DepsMut<HubQuery>,
    info: MessageInfo,
    nonce: u64,
) -> Result<Response<HubMsg>, ContractError> {
    nonpayable(&info)?;
    ADMIN.assert_admin(deps.as_ref(), &info.sender)?;

    let cfg = CONFIG.load(deps.storage)?;
    let event = outgoing::cancel_batch(deps.storage, &cfg, nonce)?;
    Ok(Response::new()
        .add_attribute("action", "cancel_batch")
        .add_event(event))
}

/// Appends the messages, events and attributes of `other` to `res`.
fn merge(res: Response<HubMsg>, other: Response<HubMsg>) -> Response<HubMsg> {
    res.add_submessages(other.messages)
        .add_events(other.events)
        .add_attributes(other.attributes)
}

fn handle_end_block(deps: DepsMut<HubQuery>, env: Env) -> Result<Response<HubMsg>, ContractError> {
    let cfg = CONFIG.load(deps.storage)?;
    let DepsMut {
        storage,
        api,
        querier,
    } = deps;
    let prices = OraclePrices::new(&querier, cfg.oracle.as_ref());
    let ctx = BridgeContext {
        api,
        env: &env,
        config: &cfg,
        powers: &querier,
        prices: &prices,
    };
    let height = env.block.height;

    let mut res = outgoing::expire_stale_pool_entries(storage, &env, &cfg)?;

    if !cfg.halted {
        for bridged in &cfg.coins {
            match outgoing::build_batch(storage, &ctx, &bridged.denom, cfg.batch_size) {
                Ok(batch) => res = res.add_event(outgoing_batch_event(&cfg, &batch)),
                Err(ContractError::EmptyBatch(_)) => {}
                Err(err) => warn!("no batch of {} at height {}: {}", bridged.denom, height, err),
            }
        }
    }

    res = merge(res, valset::maybe_request_valset(storage, &ctx)?);
    res = merge(res, valset::slash_non_signers(storage, &ctx)?);

    let pruned = prune_attestations(storage, height.saturating_sub(cfg.attestation_window))?;
    if pruned > 0 {
        debug!("pruned {} attestations at height {}", pruned, height);
    }
    Ok(res)
}
