use cosmwasm_logging::{debug, init_cosmwasm_logger};
use cosmwasm_std::{
    attr, to_json_binary, Deps, DepsMut, Env, MessageInfo, QueryResponse, Response,
};
use cw2::{get_contract_version, set_contract_version};
use cw_utils::{maybe_addr, nonpayable};

use hub_apis::oracle_api::Price;
use hub_apis::SudoMsg;
use hub_attestation::prune_attestations;
use hub_bindings::{HubMsg, HubQuery};

use crate::error::ContractError;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::state::config::{
    default_required_prices, Config, ADMIN, CONFIG, DEFAULT_CLAIMS_WINDOW, DEFAULT_EPOCH_LENGTH,
};
use crate::state::prices::CURRENT_EPOCH;
use crate::{epoch, queries};

pub const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn instantiate(
    mut deps: DepsMut<HubQuery>,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response<HubMsg>, ContractError> {
    nonpayable(&info)?;

    let config = Config {
        epoch_length: msg.epoch_length.unwrap_or(DEFAULT_EPOCH_LENGTH),
        required_prices: msg.required_prices.unwrap_or_else(default_required_prices),
        claims_window: msg.claims_window.unwrap_or(DEFAULT_CLAIMS_WINDOW),
    };
    config.validate()?;
    CONFIG.save(deps.storage, &config)?;
    CURRENT_EPOCH.save(deps.storage, &1)?;

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
        QueryMsg::CurrentEpoch {} => Ok(to_json_binary(&queries::current_epoch(deps)?)?),
        QueryMsg::Prices {} => Ok(to_json_binary(&queries::prices(deps)?)?),
        QueryMsg::Price { name } => Ok(to_json_binary(&queries::price(deps, name)?)?),
        QueryMsg::EpochVotes { epoch } => {
            Ok(to_json_binary(&queries::epoch_votes(deps, epoch)?)?)
        }
        QueryMsg::Attestation { epoch } => {
            Ok(to_json_binary(&queries::attestation(deps, epoch)?)?)
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
        ExecuteMsg::UpdateConfig {
            epoch_length,
            required_prices,
            claims_window,
        } => handle_update_config(deps, info, epoch_length, required_prices, claims_window),
        ExecuteMsg::SubmitPrices { epoch, prices } => {
            handle_submit_prices(deps, env, info, epoch, prices)
        }
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

fn handle_update_config(
    deps: DepsMut<HubQuery>,
    info: MessageInfo,
    epoch_length: Option<u64>,
    required_prices: Option<Vec<String>>,
    claims_window: Option<u64>,
) -> Result<Response<HubMsg>, ContractError> {
    nonpayable(&info)?;
    ADMIN.assert_admin(deps.as_ref(), &info.sender)?;

    let mut cfg = CONFIG.load(deps.storage)?;
    let mut attributes = vec![
        attr("action", "update_config"),
        attr("sender", info.sender),
    ];
    if let Some(epoch_length) = epoch_length {
        cfg.epoch_length = epoch_length;
        attributes.push(attr("epoch_length", epoch_length.to_string()));
    }
    if let Some(required_prices) = required_prices {
        attributes.push(attr("required_prices", required_prices.join(",")));
        cfg.required_prices = required_prices;
    }
    if let Some(claims_window) = claims_window {
        cfg.claims_window = claims_window;
        attributes.push(attr("claims_window", claims_window.to_string()));
    }
    cfg.validate()?;
    CONFIG.save(deps.storage, &cfg)?;

    Ok(Response::new().add_attributes(attributes))
}

fn handle_submit_prices(
    deps: DepsMut<HubQuery>,
    env: Env,
    info: MessageInfo,
    epoch: u64,
    prices: Vec<Price>,
) -> Result<Response<HubMsg>, ContractError> {
    nonpayable(&info)?;
    let cfg = CONFIG.load(deps.storage)?;
    let DepsMut {
        storage, querier, ..
    } = deps;
    epoch::submit_prices(
        storage,
        &querier,
        &cfg,
        info.sender.as_str(),
        epoch,
        prices,
        env.block.height,
    )
}

fn handle_end_block(deps: DepsMut<HubQuery>, env: Env) -> Result<Response<HubMsg>, ContractError> {
    let cfg = CONFIG.load(deps.storage)?;
    let DepsMut {
        storage, querier, ..
    } = deps;
    let height = env.block.height;

    let mut res = Response::new();
    if height % cfg.epoch_length == 0 {
        res = epoch::advance_epoch(storage, &querier, &cfg)?;
    }

    let pruned = prune_attestations(storage, height.saturating_sub(cfg.claims_window))?;
    if pruned > 0 {
        debug!("pruned {} price attestations at height {}", pruned, height);
    }
    Ok(res)
}
