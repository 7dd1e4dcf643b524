//! Valset manager: snapshots of the external signer set and jailing of validators that do not
//! sign them.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use cosmwasm_logging::{info, warn};
use cosmwasm_std::{Decimal, Order, Response, StdResult, Storage, Uint256};
use cw_storage_plus::Bound;

use hub_attestation::VotingPowerOracle;
use hub_bindings::HubMsg;

use crate::dispatch::BridgeContext;
use crate::error::ContractError;
use crate::events::{
    validator_status_change_event, valset_executed_event, valset_request_event, ValidatorStatus,
};
use crate::state::signers::SIGNERS;
use crate::state::valset::{
    latest_valset, next_valset_nonce, remove_valset_request, BridgeValidator, Valset,
    CURRENT_VALSET, VALSET_CONFIRMS, VALSET_REQUESTS,
};

/// Canonical member order: power descending, then external address ascending.
pub fn member_order(a: &BridgeValidator, b: &BridgeValidator) -> Ordering {
    b.power
        .cmp(&a.power)
        .then_with(|| a.external_address.cmp(&b.external_address))
        .then_with(|| a.validator.cmp(&b.validator))
}

pub fn sort_members(members: &mut [BridgeValidator]) {
    members.sort_by(member_order);
}

/// Bonded validators with a registered signer key, in canonical order.
pub(crate) fn current_members(
    storage: &dyn Storage,
    powers: &dyn VotingPowerOracle,
) -> Result<Vec<BridgeValidator>, ContractError> {
    let mut members = vec![];
    for bonded in powers.bonded_validators()? {
        if bonded.power == 0 {
            continue;
        }
        if let Some(signer) = SIGNERS.may_load(storage, &bonded.validator)? {
            members.push(BridgeValidator {
                validator: bonded.validator,
                external_address: signer.external_address,
                power: bonded.power,
            });
        }
    }
    sort_members(&mut members);
    Ok(members)
}

/// Whether the normalized power distribution moved by more than `threshold`.
///
/// The drift is the sum over every validator of the difference between its share of the total
/// power in `old` and in `new`. Validators missing from one side count with zero power.
pub fn power_drift_exceeds(
    old: &[BridgeValidator],
    new: &[BridgeValidator],
    threshold: Decimal,
) -> Result<bool, ContractError> {
    let old_total: u128 = old.iter().map(|m| u128::from(m.power)).sum();
    let new_total: u128 = new.iter().map(|m| u128::from(m.power)).sum();
    if old_total == 0 || new_total == 0 {
        return Ok(old_total != new_total);
    }

    let mut powers: BTreeMap<&str, (u128, u128)> = BTreeMap::new();
    for member in old {
        powers.entry(&member.validator).or_default().0 = u128::from(member.power);
    }
    for member in new {
        powers.entry(&member.validator).or_default().1 = u128::from(member.power);
    }

    // sum |old_i / old_total - new_i / new_total|, scaled by old_total * new_total
    let mut drift = Uint256::zero();
    for (old_power, new_power) in powers.values() {
        let before = Uint256::from(*old_power).checked_mul(Uint256::from(new_total))?;
        let after = Uint256::from(*new_power).checked_mul(Uint256::from(old_total))?;
        drift = drift.checked_add(before.abs_diff(after))?;
    }

    let scale = Uint256::from(old_total).checked_mul(Uint256::from(new_total))?;
    let lhs = drift.checked_mul(Uint256::from(Decimal::one().atomics()))?;
    let rhs = scale.checked_mul(Uint256::from(threshold.atomics()))?;
    Ok(lhs > rhs)
}

/// Requests a new valset when none exists yet, or when the signer set drifted away from the
/// newest pending request, or from the current valset when nothing is pending.
pub(crate) fn maybe_request_valset(
    storage: &mut dyn Storage,
    ctx: &BridgeContext,
) -> Result<Response<HubMsg>, ContractError> {
    let members = current_members(storage, ctx.powers)?;
    if members.is_empty() {
        return Ok(Response::new());
    }

    let needed = match latest_valset(storage)? {
        None => true,
        Some(latest) => {
            power_drift_exceeds(&latest.members, &members, ctx.config.valset_drift_threshold)?
        }
    };
    if !needed {
        return Ok(Response::new());
    }

    let valset = Valset {
        nonce: next_valset_nonce(storage)?,
        members,
        height: ctx.env.block.height,
    };
    VALSET_REQUESTS.save(storage, valset.nonce, &valset)?;
    info!(
        "requested valset {} with {} members",
        valset.nonce,
        valset.members.len()
    );
    Ok(Response::new().add_event(valset_request_event(ctx.config, &valset)))
}

/// Promotes an executed valset request to the current valset. It supersedes every request up
/// to its nonce.
pub(crate) fn valset_executed(
    storage: &mut dyn Storage,
    nonce: u64,
) -> Result<Response<HubMsg>, ContractError> {
    let valset = VALSET_REQUESTS
        .may_load(storage, nonce)?
        .ok_or(ContractError::UnknownValset(nonce))?;
    CURRENT_VALSET.save(storage, &valset)?;

    let superseded = VALSET_REQUESTS
        .keys(storage, None, Some(Bound::inclusive(nonce)), Order::Ascending)
        .collect::<StdResult<Vec<u64>>>()?;
    for request in superseded {
        remove_valset_request(storage, request)?;
    }
    Ok(Response::new().add_event(valset_executed_event(nonce)))
}

/// Jails every bonded validator that did not confirm a valset request older than the signing
/// window, then drops those requests.
pub(crate) fn slash_non_signers(
    storage: &mut dyn Storage,
    ctx: &BridgeContext,
) -> Result<Response<HubMsg>, ContractError> {
    let height = ctx.env.block.height;
    let Some(cutoff) = height.checked_sub(ctx.config.signed_valsets_window) else {
        return Ok(Response::new());
    };
    let stale = VALSET_REQUESTS
        .range(storage, None, None, Order::Ascending)
        .filter(|item| !matches!(item, Ok((_, valset)) if valset.height >= cutoff))
        .map(|item| item.map(|(nonce, _)| nonce))
        .collect::<StdResult<Vec<u64>>>()?;
    if stale.is_empty() {
        return Ok(Response::new());
    }

    let bonded = ctx.powers.bonded_validators()?;
    let mut jailed = BTreeSet::new();
    let mut res = Response::new();
    for nonce in stale {
        for validator in &bonded {
            if validator.power == 0 || jailed.contains(&validator.validator) {
                continue;
            }
            if VALSET_CONFIRMS.has(storage, (nonce, validator.validator.as_str())) {
                continue;
            }
            warn!(
                "jailing {}: valset {} was not confirmed",
                validator.validator, nonce
            );
            jailed.insert(validator.validator.clone());
            res = res
                .add_message(HubMsg::JailValidator {
                    validator: validator.validator.clone(),
                })
                .add_event(validator_status_change_event(
                    &validator.validator,
                    ValidatorStatus::Jailed,
                ));
        }
        remove_valset_request(storage, nonce)?;
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::MockStorage;
    use cosmwasm_std::{Binary, CosmosMsg};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    use crate::state::signers::{Confirm, ExternalSigner};
    use crate::test_utils::TestContext;

    fn member(validator: &str, external_address: &str, power: u64) -> BridgeValidator {
        BridgeValidator {
            validator: validator.to_string(),
            external_address: external_address.to_string(),
            power,
        }
    }

    fn register_signers(storage: &mut MockStorage, t: &TestContext, names: &[&str]) {
        for (i, name) in names.iter().enumerate() {
            SIGNERS
                .save(
                    storage,
                    t.addr(name).as_str(),
                    &ExternalSigner {
                        external_address: format!("0x{:040x}", i + 1),
                        pubkey: Binary::from(vec![2u8; 33]),
                    },
                )
                .unwrap();
        }
    }

    #[test]
    fn members_sort_by_power_then_address() {
        let sorted = vec![
            member("v3", "0x03", 30),
            member("v1", "0x01", 20),
            member("v2", "0x02", 20),
            member("v5", "0x0a", 10),
            member("v4", "0x0b", 10),
            member("v6", "0x0c", 1),
        ];

        let mut again = sorted.clone();
        sort_members(&mut again);
        assert_eq!(again, sorted);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let mut shuffled = sorted.clone();
            shuffled.shuffle(&mut rng);
            sort_members(&mut shuffled);
            assert_eq!(shuffled, sorted);
        }
    }

    #[test]
    fn drift_boundary_is_exclusive() {
        let old = vec![member("a", "0x01", 10_000), member("b", "0x02", 10_000)];
        let threshold = Decimal::percent(1);

        // 100 of 20 000 moved from b to a: 1% drift
        let exactly = vec![member("a", "0x01", 10_100), member("b", "0x02", 9_900)];
        assert!(!power_drift_exceeds(&old, &exactly, threshold).unwrap());

        // 1.01% drift
        let above = vec![member("a", "0x01", 10_101), member("b", "0x02", 9_899)];
        assert!(power_drift_exceeds(&old, &above, threshold).unwrap());

        // scaling every power changes nothing
        let scaled = vec![member("a", "0x01", 20_000), member("b", "0x02", 20_000)];
        assert!(!power_drift_exceeds(&old, &scaled, threshold).unwrap());

        // a new member takes a third of the power
        let joined = vec![
            member("a", "0x01", 10_000),
            member("b", "0x02", 10_000),
            member("c", "0x03", 10_000),
        ];
        assert!(power_drift_exceeds(&old, &joined, threshold).unwrap());
    }

    #[test]
    fn first_valset_is_requested_then_only_on_drift() {
        let mut t = TestContext::new(&[("val1", 50), ("val2", 30), ("val3", 20)]);
        let mut storage = MockStorage::new();

        // no signer keys, nothing to snapshot
        let res = maybe_request_valset(&mut storage, &t.ctx()).unwrap();
        assert!(res.events.is_empty());

        register_signers(&mut storage, &t, &["val1", "val2"]);
        let res = maybe_request_valset(&mut storage, &t.ctx()).unwrap();
        assert_eq!(res.events[0].ty, "valset_request");
        let valset = VALSET_REQUESTS.load(&storage, 1).unwrap();
        assert_eq!(valset.members.len(), 2);
        assert_eq!(valset.members[0].validator, t.addr("val1").as_str());
        assert_eq!(valset.members[0].power, 50);

        let res = maybe_request_valset(&mut storage, &t.ctx()).unwrap();
        assert!(res.events.is_empty());

        let val2 = t.addr("val2");
        t.powers.set(val2.as_str(), 50);
        let res = maybe_request_valset(&mut storage, &t.ctx()).unwrap();
        assert_eq!(res.events.len(), 1);
        assert!(VALSET_REQUESTS.has(&storage, 2));
    }

    #[test]
    fn executed_valset_becomes_current() {
        let t = TestContext::new(&[("val1", 50), ("val2", 50)]);
        let mut storage = MockStorage::new();
        register_signers(&mut storage, &t, &["val1", "val2"]);
        maybe_request_valset(&mut storage, &t.ctx()).unwrap();
        let mut t2 = TestContext::new(&[("val1", 90), ("val2", 10)]);
        t2.env.block.height += 1;
        maybe_request_valset(&mut storage, &t2.ctx()).unwrap();
        assert!(VALSET_REQUESTS.has(&storage, 2));

        let err = valset_executed(&mut storage, 7).unwrap_err();
        assert_eq!(err, ContractError::UnknownValset(7));

        valset_executed(&mut storage, 2).unwrap();
        assert_eq!(CURRENT_VALSET.load(&storage).unwrap().nonce, 2);
        assert!(!VALSET_REQUESTS.has(&storage, 1));
        assert!(!VALSET_REQUESTS.has(&storage, 2));

        // the current valset is the reference once nothing is pending
        let res = maybe_request_valset(&mut storage, &t2.ctx()).unwrap();
        assert!(res.events.is_empty());
    }

    #[test]
    fn non_signers_are_jailed_once_the_window_passes() {
        let mut t = TestContext::new(&[("val1", 50), ("val2", 30), ("val3", 20)]);
        let mut storage = MockStorage::new();
        register_signers(&mut storage, &t, &["val1", "val2", "val3"]);
        maybe_request_valset(&mut storage, &t.ctx()).unwrap();
        let val1 = t.addr("val1").to_string();
        VALSET_CONFIRMS
            .save(
                &mut storage,
                (1, val1.as_str()),
                &Confirm {
                    validator: val1.clone(),
                    external_address: "0x01".to_string(),
                    signature: Binary::from(vec![0u8; 64]),
                    height: t.env.block.height,
                },
            )
            .unwrap();

        let requested_at = t.env.block.height;
        t.env.block.height = requested_at + t.config.signed_valsets_window;
        let res = slash_non_signers(&mut storage, &t.ctx()).unwrap();
        assert!(res.messages.is_empty());
        assert!(VALSET_REQUESTS.has(&storage, 1));

        t.env.block.height += 1;
        let res = slash_non_signers(&mut storage, &t.ctx()).unwrap();
        let mut jailed: Vec<String> = res
            .messages
            .iter()
            .map(|sub| match &sub.msg {
                CosmosMsg::Custom(HubMsg::JailValidator { validator }) => validator.clone(),
                other => panic!("unexpected message {other:?}"),
            })
            .collect();
        jailed.sort();
        let mut expected = vec![t.addr("val2").to_string(), t.addr("val3").to_string()];
        expected.sort();
        assert_eq!(jailed, expected);
        assert!(res
            .events
            .iter()
            .all(|ev| ev.ty == "validator_status_change"));
        assert!(!VALSET_REQUESTS.has(&storage, 1));
        assert!(!VALSET_CONFIRMS.has(&storage, (1, val1.as_str())));
    }
}
