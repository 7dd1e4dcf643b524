//! Outgoing pool and batch builder.
//!
//! Withdrawals stay in [`OUTGOING_POOL`] until the batch containing them is executed on the
//! external chain. The fee index only holds the entries that are not part of a live batch.

use cosmwasm_logging::debug;
use cosmwasm_std::{
    coins, to_json_binary, Addr, BankMsg, Coin, Env, Event, Order, Response, StdResult, Storage,
    Uint128,
};
use cw_storage_plus::Bound;
use sha2::{Digest, Sha256};

use hub_bindings::HubMsg;

use crate::dispatch::BridgeContext;
use crate::error::ContractError;
use crate::events::{batch_canceled_event, batch_executed_event, outgoing_batch_event, refund_event};
use crate::fees;
use crate::state::batch::{next_batch_nonce, remove_batch, OutgoingTxBatch, BATCHES};
use crate::state::config::Config;
use crate::state::pool::{
    index_pool_entry, next_pool_id, pool_id, unindex_pool_entry, OutgoingTx, OUTGOING_POOL,
    POOL_EXPIRY, UNBATCHED,
};
use crate::state::status::{set_tx_status, TxStatus};

/// A withdrawal about to enter the pool.
pub(crate) struct NewWithdrawal {
    pub sender: Addr,
    pub destination: String,
    pub amount: Coin,
    pub fee: Uint128,
    pub refund_address: Option<String>,
    /// Originating transaction. Derived from the block and pool id if unset.
    pub tx_hash: Option<String>,
    /// Whether the entry is refunded after `pool_entry_ttl`
    pub expires: bool,
}

/// Hash identifying a withdrawal requested on the hub.
fn local_tx_hash(env: &Env, pool_id: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(env.block.chain_id.as_bytes());
    hasher.update(env.block.height.to_be_bytes());
    hasher.update(env.transaction.as_ref().map_or(0, |tx| tx.index).to_be_bytes());
    hasher.update(pool_id.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Adds a withdrawal to the pool and makes it available for batching.
pub(crate) fn enqueue(
    storage: &mut dyn Storage,
    env: &Env,
    cfg: &Config,
    withdrawal: NewWithdrawal,
) -> Result<OutgoingTx, ContractError> {
    if withdrawal.amount.amount.is_zero() {
        return Err(ContractError::InvalidAmount);
    }
    if withdrawal.destination.trim().is_empty() {
        return Err(ContractError::InvalidDestination);
    }

    let id = next_pool_id(storage)?;
    let now = env.block.time.seconds();
    let tx = OutgoingTx {
        id,
        sender: withdrawal.sender,
        destination: withdrawal.destination,
        amount: withdrawal.amount,
        fee: withdrawal.fee,
        refund_address: withdrawal.refund_address,
        tx_hash: withdrawal
            .tx_hash
            .unwrap_or_else(|| local_tx_hash(env, id)),
        created_at: now,
        expires_at: withdrawal
            .expires
            .then(|| now.saturating_add(cfg.pool_entry_ttl)),
    };
    OUTGOING_POOL.save(storage, id, &tx)?;
    index_pool_entry(storage, &tx)?;
    Ok(tx)
}

/// Withdrawals of `denom` available for batching, highest fee first.
pub(crate) fn unbatched(
    storage: &dyn Storage,
    denom: &str,
    limit: usize,
) -> Result<Vec<OutgoingTx>, ContractError> {
    let ids = UNBATCHED
        .sub_prefix(denom)
        .keys(storage, None, None, Order::Descending)
        .take(limit)
        .map(|key| key.map(|(_, inverted_id)| pool_id(inverted_id)))
        .collect::<StdResult<Vec<u64>>>()?;
    ids.into_iter()
        .map(|id| {
            OUTGOING_POOL
                .may_load(storage, id)?
                .ok_or(ContractError::MissingPoolEntry(id))
        })
        .collect()
}

/// Commits the highest paying withdrawals of `denom` to a new batch.
pub(crate) fn build_batch(
    storage: &mut dyn Storage,
    ctx: &BridgeContext,
    denom: &str,
    max_size: u32,
) -> Result<OutgoingTxBatch, ContractError> {
    if ctx.config.halted {
        return Err(ContractError::BridgeHalted);
    }
    if max_size == 0 {
        return Err(ContractError::InvalidBatchSize);
    }
    let coin = ctx.config.coin_by_denom(denom)?;

    let transactions = unbatched(storage, denom, max_size as usize)?;
    if transactions.is_empty() {
        return Err(ContractError::EmptyBatch(denom.to_string()));
    }
    let batch_fee = transactions
        .iter()
        .try_fold(Uint128::zero(), |total, tx| total.checked_add(tx.fee))?;
    fees::ensure_batch_fees(
        ctx.prices,
        ctx.config,
        coin,
        batch_fee,
        transactions.len() as u64,
    )?;

    let nonce = next_batch_nonce(storage)?;
    let height = ctx.env.block.height;
    for tx in &transactions {
        unindex_pool_entry(storage, tx);
        set_tx_status(
            storage,
            &tx.tx_hash,
            TxStatus::BatchCreated,
            Some(nonce.to_string()),
            height,
        )?;
    }
    let batch = OutgoingTxBatch {
        nonce,
        denom: denom.to_string(),
        transactions,
        height,
    };
    BATCHES.save(storage, nonce, &batch)?;
    debug!(
        "built batch {} of {} withdrawals of {}",
        nonce,
        batch.transactions.len(),
        denom
    );
    Ok(batch)
}

/// Builds a batch and reports it.
pub(crate) fn request_batch(
    storage: &mut dyn Storage,
    ctx: &BridgeContext,
    denom: &str,
    max_size: u32,
) -> Result<Response<HubMsg>, ContractError> {
    let batch = build_batch(storage, ctx, denom, max_size)?;
    Ok(Response::new()
        .set_data(to_json_binary(&batch.nonce)?)
        .add_event(outgoing_batch_event(ctx.config, &batch)))
}

/// Deletes a batch and returns its withdrawals to the fee index, with their original fees.
pub(crate) fn cancel_batch(
    storage: &mut dyn Storage,
    cfg: &Config,
    nonce: u64,
) -> Result<Event, ContractError> {
    let batch = BATCHES
        .may_load(storage, nonce)?
        .ok_or(ContractError::UnknownBatch(nonce))?;
    for batched in &batch.transactions {
        let tx = OUTGOING_POOL
            .may_load(storage, batched.id)?
            .ok_or(ContractError::MissingPoolEntry(batched.id))?;
        index_pool_entry(storage, &tx)?;
    }
    remove_batch(storage, nonce)?;
    Ok(batch_canceled_event(cfg, nonce))
}

/// Retires a batch executed on the external chain.
///
/// Its withdrawals leave the pool for good and their vouchers are burned. Older batches of the
/// same denom can no longer be executed and are cancelled.
pub(crate) fn batch_executed(
    storage: &mut dyn Storage,
    ctx: &BridgeContext,
    nonce: u64,
    tx_hash: &str,
) -> Result<Response<HubMsg>, ContractError> {
    let batch = BATCHES
        .may_load(storage, nonce)?
        .ok_or(ContractError::UnknownBatch(nonce))?;

    let mut burned = Uint128::zero();
    for tx in &batch.transactions {
        if !OUTGOING_POOL.has(storage, tx.id) {
            return Err(ContractError::MissingPoolEntry(tx.id));
        }
        OUTGOING_POOL.remove(storage, tx.id);
        burned = burned.checked_add(tx.amount.amount)?.checked_add(tx.fee)?;
        set_tx_status(
            storage,
            &tx.tx_hash,
            TxStatus::BatchExecuted,
            Some(tx_hash.to_string()),
            ctx.env.block.height,
        )?;
    }

    let stale = BATCHES
        .range(storage, None, Some(Bound::exclusive(nonce)), Order::Ascending)
        .filter(|item| !matches!(item, Ok((_, older)) if older.denom != batch.denom))
        .map(|item| item.map(|(older, _)| older))
        .collect::<StdResult<Vec<u64>>>()?;

    let mut res = Response::new();
    for older in stale {
        res = res.add_event(cancel_batch(storage, ctx.config, older)?);
    }
    remove_batch(storage, nonce)?;

    if !burned.is_zero() {
        res = res.add_message(BankMsg::Burn {
            amount: coins(burned.u128(), &batch.denom),
        });
    }
    Ok(res.add_event(batch_executed_event(&batch, tx_hash)))
}

/// Refunds every withdrawal that waited in the fee index past its expiration.
///
/// Hub senders get their amount and fee back. Routed deposits go back out to their external
/// sender as a new withdrawal that never expires.
pub(crate) fn expire_stale_pool_entries(
    storage: &mut dyn Storage,
    env: &Env,
    cfg: &Config,
) -> Result<Response<HubMsg>, ContractError> {
    let now = env.block.time.seconds();
    let expired = POOL_EXPIRY
        .keys(
            storage,
            None,
            Some(Bound::exclusive((now, 0u64))),
            Order::Ascending,
        )
        .collect::<StdResult<Vec<_>>>()?;

    let mut res = Response::new();
    for (_, id) in expired {
        let tx = OUTGOING_POOL
            .may_load(storage, id)?
            .ok_or(ContractError::MissingPoolEntry(id))?;
        unindex_pool_entry(storage, &tx);
        OUTGOING_POOL.remove(storage, id);

        let refund = Coin::new(tx.amount.amount.checked_add(tx.fee)?, &tx.amount.denom);
        let recipient = match tx.refund_address {
            Some(refund_address) => {
                let requeued = enqueue(
                    storage,
                    env,
                    cfg,
                    NewWithdrawal {
                        sender: tx.sender.clone(),
                        destination: refund_address,
                        amount: refund.clone(),
                        fee: Uint128::zero(),
                        refund_address: None,
                        tx_hash: Some(tx.tx_hash.clone()),
                        expires: false,
                    },
                )?;
                requeued.destination
            }
            None => {
                res = res.add_message(BankMsg::Send {
                    to_address: tx.sender.to_string(),
                    amount: vec![refund.clone()],
                });
                tx.sender.to_string()
            }
        };
        set_tx_status(
            storage,
            &tx.tx_hash,
            TxStatus::Refunded,
            None,
            env.block.height,
        )?;
        res = res.add_event(refund_event(&tx.tx_hash, &recipient, &refund));
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::MockStorage;
    use cosmwasm_std::{coin, CosmosMsg};
    use hub_apis::bridge_api::BridgedCoin;

    use crate::state::config::DEFAULT_POOL_ENTRY_TTL;
    use crate::state::status::TX_STATUS;
    use crate::test_utils::{FixedPrices, TestContext, ETH_DENOM, ONE};

    const DAI_DENOM: &str = "hub/dai";

    fn setup() -> (MockStorage, TestContext) {
        let mut t = TestContext::new(&[("val1", 10)]);
        t.config.coins.push(BridgedCoin {
            denom: DAI_DENOM.to_string(),
            external_id: "0x6b175474e89094c44da98b954eedeac495271d0f".to_string(),
            decimals: 18,
            price_name: "dai/0".to_string(),
            commission: None,
        });
        (MockStorage::new(), t)
    }

    fn queue(
        storage: &mut MockStorage,
        t: &TestContext,
        denom: &str,
        amount: u128,
        fee: u128,
    ) -> OutgoingTx {
        enqueue(
            storage,
            &t.env,
            &t.config,
            NewWithdrawal {
                sender: t.addr("alice"),
                destination: "0xb0b".to_string(),
                amount: coin(amount, denom),
                fee: Uint128::new(fee),
                refund_address: None,
                tx_hash: None,
                expires: true,
            },
        )
        .unwrap()
    }

    fn available(storage: &MockStorage, denom: &str) -> Vec<u64> {
        unbatched(storage, denom, usize::MAX)
            .unwrap()
            .into_iter()
            .map(|tx| tx.id)
            .collect()
    }

    #[test]
    fn enqueue_assigns_sequential_ids() {
        let (mut storage, t) = setup();
        let first = queue(&mut storage, &t, ETH_DENOM, 100, 1);
        let second = queue(&mut storage, &t, ETH_DENOM, 100, 1);
        assert_eq!((first.id, second.id), (1, 2));
        assert_ne!(first.tx_hash, second.tx_hash);
        assert_eq!(
            first.expires_at,
            Some(t.env.block.time.seconds() + DEFAULT_POOL_ENTRY_TTL)
        );

        let err = enqueue(
            &mut storage,
            &t.env,
            &t.config,
            NewWithdrawal {
                sender: t.addr("alice"),
                destination: "0xb0b".to_string(),
                amount: coin(0, ETH_DENOM),
                fee: Uint128::new(5),
                refund_address: None,
                tx_hash: None,
                expires: true,
            },
        )
        .unwrap_err();
        assert_eq!(err, ContractError::InvalidAmount);
    }

    #[test]
    fn batches_take_the_highest_fees_first() {
        let (mut storage, t) = setup();
        queue(&mut storage, &t, ETH_DENOM, 100, 5);
        queue(&mut storage, &t, ETH_DENOM, 100, 20);
        queue(&mut storage, &t, ETH_DENOM, 100, 5);
        queue(&mut storage, &t, ETH_DENOM, 100, 10);
        queue(&mut storage, &t, DAI_DENOM, 100, 50);

        let batch = build_batch(&mut storage, &t.ctx(), ETH_DENOM, 3).unwrap();
        assert_eq!(batch.nonce, 1);
        let ids: Vec<u64> = batch.transactions.iter().map(|tx| tx.id).collect();
        // equal fees keep insertion order
        assert_eq!(ids, vec![2, 4, 1]);
        assert_eq!(batch.total_fee(), Uint128::new(35));

        // batched entries are no longer available, but stay in the pool
        assert_eq!(available(&storage, ETH_DENOM), vec![3]);
        assert_eq!(available(&storage, DAI_DENOM), vec![5]);
        for id in ids {
            assert!(OUTGOING_POOL.has(&storage, id));
        }
        let status = TX_STATUS.load(&storage, &batch.transactions[0].tx_hash).unwrap();
        assert_eq!(status.status, TxStatus::BatchCreated);
        assert_eq!(status.info, Some("1".to_string()));

        let batch = build_batch(&mut storage, &t.ctx(), ETH_DENOM, 3).unwrap();
        assert_eq!(batch.nonce, 2);
        let err = build_batch(&mut storage, &t.ctx(), ETH_DENOM, 3).unwrap_err();
        assert_eq!(err, ContractError::EmptyBatch(ETH_DENOM.to_string()));
    }

    #[test]
    fn batch_fees_must_cover_gas() {
        let (mut storage, mut t) = setup();
        queue(&mut storage, &t, ETH_DENOM, 1_000_000, 1);
        t.prices = FixedPrices::new(&[
            ("eth/0", 2_000 * ONE),
            ("eth/gas", 20 * ONE),
        ]);
        let err = build_batch(&mut storage, &t.ctx(), ETH_DENOM, 10).unwrap_err();
        assert!(matches!(err, ContractError::InsufficientGas { .. }));
        // nothing was taken out of the pool
        assert_eq!(available(&storage, ETH_DENOM), vec![1]);

        t.config.halted = true;
        let err = build_batch(&mut storage, &t.ctx(), ETH_DENOM, 10).unwrap_err();
        assert_eq!(err, ContractError::BridgeHalted);
    }

    #[test]
    fn cancelled_batches_return_their_withdrawals_once() {
        let (mut storage, t) = setup();
        queue(&mut storage, &t, ETH_DENOM, 100, 5);
        queue(&mut storage, &t, ETH_DENOM, 100, 7);
        let batch = build_batch(&mut storage, &t.ctx(), ETH_DENOM, 10).unwrap();
        assert!(available(&storage, ETH_DENOM).is_empty());

        let event = cancel_batch(&mut storage, &t.config, batch.nonce).unwrap();
        assert_eq!(event.ty, "outgoing_batch_canceled");
        assert_eq!(available(&storage, ETH_DENOM), vec![2, 1]);
        assert!(!BATCHES.has(&storage, batch.nonce));

        let err = cancel_batch(&mut storage, &t.config, batch.nonce).unwrap_err();
        assert_eq!(err, ContractError::UnknownBatch(batch.nonce));

        // re-included withdrawals compete again, under a new nonce
        let rebuilt = build_batch(&mut storage, &t.ctx(), ETH_DENOM, 10).unwrap();
        assert_eq!(rebuilt.nonce, 2);
        assert_eq!(rebuilt.transactions.len(), 2);
    }

    #[test]
    fn executing_a_batch_cancels_older_batches_of_the_same_denom() {
        let (mut storage, mut t) = setup();
        t.prices = FixedPrices::new(&[
            ("eth/0", 2_000 * ONE),
            ("eth/gas", 0),
            ("dai/0", ONE),
        ]);

        queue(&mut storage, &t, DAI_DENOM, 100, 1);
        let dai = build_batch(&mut storage, &t.ctx(), DAI_DENOM, 10).unwrap();
        assert_eq!(dai.nonce, 1);
        for fee in [2, 3, 4, 5] {
            queue(&mut storage, &t, ETH_DENOM, 100, fee);
            build_batch(&mut storage, &t.ctx(), ETH_DENOM, 10).unwrap();
        }
        // pool ids 2 to 5 sit in batches 2 to 5

        let res = batch_executed(&mut storage, &t.ctx(), 5, "0xexecuted").unwrap();

        let cancelled: Vec<String> = res
            .events
            .iter()
            .filter(|ev| ev.ty == "outgoing_batch_canceled")
            .map(|ev| ev.attributes[2].value.clone())
            .collect();
        assert_eq!(cancelled, vec!["2", "3", "4"]);
        for nonce in 2..=5 {
            assert!(!BATCHES.has(&storage, nonce));
        }
        assert!(BATCHES.has(&storage, 1));

        // withdrawals of cancelled batches are back, the executed one is gone
        assert_eq!(available(&storage, ETH_DENOM), vec![4, 3, 2]);
        assert!(!OUTGOING_POOL.has(&storage, 5));
        assert_eq!(
            res.messages[0].msg,
            CosmosMsg::Bank(BankMsg::Burn {
                amount: coins(105, ETH_DENOM)
            })
        );

        let err = batch_executed(&mut storage, &t.ctx(), 5, "0xexecuted").unwrap_err();
        assert_eq!(err, ContractError::UnknownBatch(5));
    }

    #[test]
    fn expired_entries_are_refunded() {
        let (mut storage, mut t) = setup();
        let user = queue(&mut storage, &t, ETH_DENOM, 100, 5);
        let routed = enqueue(
            &mut storage,
            &t.env,
            &t.config,
            NewWithdrawal {
                sender: t.env.contract.address.clone(),
                destination: "0xdest".to_string(),
                amount: coin(300, ETH_DENOM),
                fee: Uint128::new(7),
                refund_address: Some("0xorigin".to_string()),
                tx_hash: Some("0xdeposit".to_string()),
                expires: true,
            },
        )
        .unwrap();
        let batched = queue(&mut storage, &t, DAI_DENOM, 100, 5);
        t.prices = FixedPrices::new(&[
            ("eth/0", 2_000 * ONE),
            ("eth/gas", 0),
            ("dai/0", ONE),
        ]);
        build_batch(&mut storage, &t.ctx(), DAI_DENOM, 10).unwrap();

        // not yet expired
        t.env.block.time = t.env.block.time.plus_seconds(DEFAULT_POOL_ENTRY_TTL);
        let res = expire_stale_pool_entries(&mut storage, &t.env, &t.config).unwrap();
        assert!(res.events.is_empty());

        t.env.block.time = t.env.block.time.plus_seconds(1);
        let res = expire_stale_pool_entries(&mut storage, &t.env, &t.config).unwrap();
        assert_eq!(res.events.len(), 2);
        assert_eq!(
            res.messages[0].msg,
            CosmosMsg::Bank(BankMsg::Send {
                to_address: user.sender.to_string(),
                amount: coins(105, ETH_DENOM),
            })
        );
        assert!(!OUTGOING_POOL.has(&storage, user.id));
        assert!(!OUTGOING_POOL.has(&storage, routed.id));

        // the routed deposit goes back to its external sender, fee included
        let requeued = unbatched(&storage, ETH_DENOM, 10).unwrap();
        assert_eq!(requeued.len(), 1);
        assert_eq!(requeued[0].destination, "0xorigin");
        assert_eq!(requeued[0].amount, coin(307, ETH_DENOM));
        assert_eq!(requeued[0].expires_at, None);
        let status = TX_STATUS.load(&storage, "0xdeposit").unwrap();
        assert_eq!(status.status, TxStatus::Refunded);

        // batched withdrawals do not expire
        assert!(OUTGOING_POOL.has(&storage, batched.id));
    }
}
