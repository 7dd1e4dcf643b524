use crate::error::ContractError;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{Deps, DepsMut, Env, MessageInfo, QueryResponse, Response};
use hub_apis::SudoMsg;
use hub_bindings::{HubMsg, HubQuery};

mod checkpoint;
mod claims;
mod confirms;
mod dispatch;
mod events;
mod fees;
mod outgoing;
mod valset;

pub mod contract;
pub mod error;
pub mod msg;
pub mod queries;
pub mod state;

#[cfg(test)]
mod multitest;
#[cfg(test)]
mod test_utils;

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut<HubQuery>,
    env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response<HubMsg>, ContractError> {
    contract::instantiate(deps, env, info, msg)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(
    deps: Deps<HubQuery>,
    env: Env,
    msg: QueryMsg,
) -> Result<QueryResponse, ContractError> {
    contract::query(deps, env, msg)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(
    deps: DepsMut<HubQuery>,
    env: Env,
    msg: MigrateMsg,
) -> Result<Response<HubMsg>, ContractError> {
    contract::migrate(deps, env, msg)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut<HubQuery>,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response<HubMsg>, ContractError> {
    contract::execute(deps, env, info, msg)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn sudo(
    deps: DepsMut<HubQuery>,
    env: Env,
    msg: SudoMsg,
) -> Result<Response<HubMsg>, ContractError> {
    contract::sudo(deps, env, msg)
}
