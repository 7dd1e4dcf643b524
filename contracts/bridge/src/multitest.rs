pub mod suite;

use assert_matches::assert_matches;
use cosmwasm_std::Uint128;
use cw_multi_test::Executor;

use hub_apis::bridge_api::BridgeClaim;
use hub_attestation::AttestationError;
use suite::SuiteBuilder;

use crate::error::ContractError;
use crate::msg::ExecuteMsg;
use crate::state::status::TxStatus;
use crate::test_utils::{ETH_EXTERNAL_ID, ONE};

/// Fee paying for a batch of one withdrawal at 20 gwei with eth at 2000
const BATCH_FEE: u128 = 2 * ONE / 1_000;

fn deposit(receiver: &str, amount: u128, tx_hash: &str) -> BridgeClaim {
    BridgeClaim::Deposit {
        external_id: ETH_EXTERNAL_ID.to_string(),
        amount: Uint128::new(amount),
        sender: "0x1111111111111111111111111111111111111111".to_string(),
        receiver: receiver.to_string(),
        tx_hash: tx_hash.to_string(),
    }
}

#[test]
fn instantiate_works() {
    let suite = SuiteBuilder::new().build();
    let config = suite.get_config();
    assert_eq!(config.oracle, Some(suite.oracle.clone()));
    assert_eq!(config.coins.len(), 1);
    assert!(!config.halted);
}

#[test]
fn deposit_is_credited_once_quorum_is_reached() {
    let mut suite = SuiteBuilder::new().build();
    let alice = suite.addr("alice");
    let claim = deposit(alice.as_str(), 1_000_000, "0xaa");

    suite.submit_claim(0, &claim).unwrap();
    assert_eq!(suite.balance(&alice), 0);

    // 70 of 100
    suite.submit_claim(1, &claim).unwrap();
    assert_eq!(suite.balance(&alice), 990_000);
    let commissions: Vec<u128> = suite
        .validators
        .iter()
        .map(|validator| suite.balance(validator))
        .collect();
    assert_eq!(commissions, vec![4_000, 3_000, 2_000, 1_000]);
    assert_eq!(
        suite.get_tx_status("0xaa").unwrap().status,
        TxStatus::DepositReceived
    );

    // validators without claims continue after the observed event
    let err = suite.submit_claim(2, &claim).unwrap_err();
    assert_matches!(
        err,
        ContractError::Attestation(AttestationError::NonContiguousNonce {
            expected: 2,
            actual: 1,
            ..
        })
    );
    assert_eq!(suite.balance(&alice), 990_000);
    assert_eq!(suite.balance(&suite.bridge), 0);
}

#[test]
fn claims_from_outside_the_validator_set_are_rejected() {
    let mut suite = SuiteBuilder::new().build();
    let stranger = suite.addr("stranger");
    let err = suite
        .app
        .execute_contract(
            stranger.clone(),
            suite.bridge.clone(),
            &ExecuteMsg::SubmitClaim {
                event_nonce: 1,
                claim: deposit(stranger.as_str(), 1_000, "0xbb"),
            },
            &[],
        )
        .unwrap_err();
    assert_eq!(
        err.downcast::<ContractError>().unwrap(),
        ContractError::Attestation(AttestationError::UnknownValidator(stranger.to_string()))
    );
}

#[test]
fn withdrawal_round_trip() {
    let mut suite = SuiteBuilder::new().build();
    suite.publish_prices(&[("eth/0", 2_000 * ONE), ("eth/gas", 20 * ONE)]);
    suite.register_signers();

    let alice = suite.addr("alice");
    let claim = deposit(alice.as_str(), ONE, "0xcc");
    suite.submit_claim(0, &claim).unwrap();
    suite.submit_claim(1, &claim).unwrap();
    assert_eq!(suite.balance(&alice), ONE / 100 * 99);

    let destination = "0x2222222222222222222222222222222222222222";
    let err = suite
        .send_to_external(&alice, ONE / 2, BATCH_FEE / 4, destination)
        .unwrap_err();
    assert_matches!(err, ContractError::InsufficientFee { .. });

    suite
        .send_to_external(&alice, ONE / 2, BATCH_FEE, destination)
        .unwrap();
    let pool = suite.get_outgoing_pool();
    assert_eq!(pool.transactions.len(), 1);
    let tx_hash = pool.transactions[0].tx_hash.clone();

    suite.end_block().unwrap();
    assert!(suite.get_outgoing_pool().transactions.is_empty());
    let batch = suite.get_pending_batch(0).unwrap();
    assert_eq!(batch.transactions[0].destination, destination);
    assert_eq!(
        batch.transactions[0].amount.amount.u128(),
        ONE / 2 - BATCH_FEE
    );

    suite.confirm_batch(0, batch.nonce).unwrap();
    assert!(suite.get_pending_batch(0).is_none());
    assert_eq!(
        suite.confirm_batch(0, batch.nonce).unwrap_err(),
        ContractError::DuplicateConfirm {
            validator: suite.validators[0].to_string(),
            nonce: batch.nonce
        }
    );

    let executed = BridgeClaim::WithdrawExecuted {
        batch_nonce: batch.nonce,
        tx_hash: "0xdd".to_string(),
    };
    suite.submit_claim(0, &executed).unwrap();
    assert_eq!(suite.balance(&suite.bridge), ONE / 2);
    suite.submit_claim(1, &executed).unwrap();

    // the withdrawn vouchers are burned
    assert_eq!(suite.balance(&suite.bridge), 0);
    assert!(suite.get_pending_batch(1).is_none());
    assert_eq!(
        suite.get_tx_status(&tx_hash).unwrap().status,
        TxStatus::BatchExecuted
    );
}

#[test]
fn unconfirmed_valsets_jail_validators() {
    let mut suite = SuiteBuilder::new().with_signed_valsets_window(10).build();
    suite.register_signers();
    suite.end_block().unwrap();

    let pending = suite.get_pending_valsets(0);
    assert_eq!(pending.valsets.len(), 1);
    let valset = pending.valsets[0].clone();
    assert_eq!(valset.members.len(), 4);
    assert_eq!(valset.members[0].validator, suite.validators[0].as_str());

    suite.confirm_valset(0, valset.nonce).unwrap();
    suite.confirm_valset(1, valset.nonce).unwrap();
    // no checkpoint exists for an unknown nonce
    suite.confirm_valset(2, valset.nonce + 1).unwrap_err();

    // still inside the signing window
    suite.app.advance_blocks(10);
    suite.end_block().unwrap();
    assert!(suite.app.jailed().is_empty());

    suite.app.advance_blocks(1);
    suite.end_block().unwrap();
    let jailed = suite.app.jailed();
    assert_eq!(jailed.len(), 2);
    assert!(jailed.contains(&suite.validators[2].to_string()));
    assert!(jailed.contains(&suite.validators[3].to_string()));
    assert!(suite.get_pending_valsets(2).valsets.is_empty());
}
