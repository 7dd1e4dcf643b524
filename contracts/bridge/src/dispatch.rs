//! Effects of observed claims.

use cosmwasm_logging::warn;
use cosmwasm_std::{coin, Api, BankMsg, CosmosMsg, Env, Response, StdResult, Storage, Uint128};

use hub_apis::bridge_api::BridgeClaim;
use hub_attestation::VotingPowerOracle;
use hub_bindings::HubMsg;

use crate::error::ContractError;
use crate::events::{deposit_received_event, refund_event, withdraw_queued_event};
use crate::fees::{self, PriceSource};
use crate::outgoing::{self, NewWithdrawal};
use crate::state::config::Config;
use crate::state::status::{set_tx_status, TxStatus};
use crate::state::valset::CURRENT_VALSET;
use crate::valset;

/// Everything a bridge operation reads besides storage.
pub(crate) struct BridgeContext<'a> {
    pub api: &'a dyn Api,
    pub env: &'a Env,
    pub config: &'a Config,
    pub powers: &'a dyn VotingPowerOracle,
    pub prices: &'a dyn PriceSource,
}

/// Applies the effect of an observed claim.
pub(crate) fn apply_claim(
    storage: &mut dyn Storage,
    ctx: &BridgeContext,
    claim: &BridgeClaim,
) -> Result<Response<HubMsg>, ContractError> {
    match claim {
        BridgeClaim::Deposit {
            external_id,
            amount,
            sender,
            receiver,
            tx_hash,
        } => {
            let receiver = ctx.api.addr_validate(receiver)?;
            let minted = mint_deposit(storage, ctx, external_id, *amount)?;
            set_tx_status(
                storage,
                tx_hash,
                TxStatus::DepositReceived,
                None,
                ctx.env.block.height,
            )?;
            Ok(Response::new()
                .add_messages(minted.messages)
                .add_message(BankMsg::Send {
                    to_address: receiver.to_string(),
                    amount: vec![coin(minted.net.u128(), &minted.denom)],
                })
                .add_event(deposit_received_event(
                    tx_hash,
                    sender,
                    receiver.as_str(),
                    &coin(amount.u128(), &minted.denom),
                    minted.commission,
                )))
        }
        BridgeClaim::SendToExternal {
            external_id,
            amount,
            fee,
            sender,
            destination,
            tx_hash,
        } => route_to_external(
            storage,
            ctx,
            external_id,
            *amount,
            *fee,
            sender,
            destination,
            tx_hash,
        ),
        BridgeClaim::WithdrawExecuted {
            batch_nonce,
            tx_hash,
        } => outgoing::batch_executed(storage, ctx, *batch_nonce, tx_hash),
        BridgeClaim::ValsetExecuted { valset_nonce } => {
            valset::valset_executed(storage, *valset_nonce)
        }
    }
}

/// Vouchers minted to the bridge for a deposit, net of commission.
struct Minted {
    denom: String,
    net: Uint128,
    commission: Uint128,
    /// Mint and commission payouts
    messages: Vec<CosmosMsg<HubMsg>>,
}

/// Mints the vouchers of a deposit to the bridge and pays the commission out to the signer set.
///
/// The commission is shared by power among the members of the current valset, or among the
/// bonded validators before any valset was executed. Rounding dust stays with the bridge.
fn mint_deposit(
    storage: &dyn Storage,
    ctx: &BridgeContext,
    external_id: &str,
    amount: Uint128,
) -> Result<Minted, ContractError> {
    let bridged = ctx.config.coin_by_external_id(external_id)?;
    if amount.is_zero() {
        return Err(ContractError::InvalidAmount);
    }
    if amount < ctx.config.min_deposit {
        return Err(ContractError::AmountBelowMinimum {
            amount: amount.to_string(),
            minimum: ctx.config.min_deposit.to_string(),
        });
    }

    let denom = bridged.denom.clone();
    let mut messages: Vec<CosmosMsg<HubMsg>> = vec![HubMsg::MintTokens {
        amount: coin(amount.u128(), &denom),
        recipient: ctx.env.contract.address.to_string(),
    }
    .into()];

    let commission = amount.mul_floor(ctx.config.commission_rate(bridged));
    let recipients = commission_recipients(storage, ctx)?;
    let total_power: u128 = recipients.iter().map(|(_, power)| u128::from(*power)).sum();
    if !commission.is_zero() && total_power > 0 {
        for (validator, power) in recipients {
            let share = commission.multiply_ratio(power, total_power);
            if share.is_zero() {
                continue;
            }
            messages.push(
                BankMsg::Send {
                    to_address: validator,
                    amount: vec![coin(share.u128(), &denom)],
                }
                .into(),
            );
        }
    }

    Ok(Minted {
        denom,
        net: amount.checked_sub(commission)?,
        commission,
        messages,
    })
}

fn commission_recipients(
    storage: &dyn Storage,
    ctx: &BridgeContext,
) -> StdResult<Vec<(String, u64)>> {
    match CURRENT_VALSET.may_load(storage)? {
        Some(valset) => Ok(valset
            .members
            .into_iter()
            .map(|member| (member.validator, member.power))
            .collect()),
        None => Ok(ctx
            .powers
            .bonded_validators()?
            .into_iter()
            .map(|bonded| (bonded.validator, bonded.power))
            .collect()),
    }
}

/// Deposit routed straight back out to the external chain.
///
/// The vouchers are minted to the bridge. When the fee pays for the withdrawal, or the bridge is
/// halted, the net amount is queued for `destination`. Otherwise it is queued back to the
/// external `sender` without fee.
#[allow(clippy::too_many_arguments)]
fn route_to_external(
    storage: &mut dyn Storage,
    ctx: &BridgeContext,
    external_id: &str,
    amount: Uint128,
    fee: Uint128,
    sender: &str,
    destination: &str,
    tx_hash: &str,
) -> Result<Response<HubMsg>, ContractError> {
    let minted = mint_deposit(storage, ctx, external_id, amount)?;
    let bridged = ctx.config.coin_by_external_id(external_id)?;
    let height = ctx.env.block.height;

    let fee_covers_cost = fee < minted.net
        && (ctx.config.halted
            || match fees::ensure_withdraw_fee(ctx.prices, ctx.config, bridged, fee) {
                Ok(()) => true,
                Err(err) => {
                    warn!("refunding send to external {}: {}", tx_hash, err);
                    false
                }
            });

    let withdrawal = if fee_covers_cost {
        set_tx_status(storage, tx_hash, TxStatus::DepositReceived, None, height)?;
        NewWithdrawal {
            sender: ctx.env.contract.address.clone(),
            destination: destination.to_string(),
            amount: coin(minted.net.checked_sub(fee)?.u128(), &minted.denom),
            fee,
            refund_address: Some(sender.to_string()),
            tx_hash: Some(tx_hash.to_string()),
            expires: true,
        }
    } else {
        set_tx_status(storage, tx_hash, TxStatus::Refunded, None, height)?;
        NewWithdrawal {
            sender: ctx.env.contract.address.clone(),
            destination: sender.to_string(),
            amount: coin(minted.net.u128(), &minted.denom),
            fee: Uint128::zero(),
            refund_address: None,
            tx_hash: Some(tx_hash.to_string()),
            expires: false,
        }
    };
    let tx = outgoing::enqueue(storage, ctx.env, ctx.config, withdrawal)?;

    let mut res = Response::new()
        .add_messages(minted.messages)
        .add_event(withdraw_queued_event(&tx));
    if !fee_covers_cost {
        res = res.add_event(refund_event(tx_hash, sender, &tx.amount));
    }
    Ok(res)
}
