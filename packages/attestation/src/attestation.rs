use std::fmt::Display;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Empty, Event, Order, Response, StdError, StdResult, Storage};
use cw_storage_plus::{Bound, Map};

use crate::error::AttestationError;
use crate::power::VotingPowerOracle;
use crate::scope::StorageScope;

/// Share of the total bonded power the voters of an attestation must hold
pub const QUORUM_PERCENT: u128 = 66;

/// Aggregate of every claim describing the same external event.
#[cw_serde]
pub struct Attestation {
    pub claim_type: String,
    /// Event nonce or epoch of the event
    pub nonce: u64,
    pub claim_hash: Binary,
    /// Voters, in the order their claims arrived
    pub votes: Vec<String>,
    /// Set once the effect was applied (or failed). Never reset.
    pub observed: bool,
    /// Height at which the first claim arrived
    pub height: u64,
}

impl Attestation {
    pub fn id(&self) -> Binary {
        attestation_id(self.nonce, &self.claim_hash)
    }
}

/// Result of re-evaluating an attestation after a vote.
#[derive(Debug)]
pub enum Tally<T = Empty> {
    /// The voters do not hold enough power yet
    Pending,
    /// The attestation had already been observed, nothing was evaluated
    AlreadyObserved,
    /// Quorum was reached and the effect was committed
    Observed(Response<T>),
    /// Quorum was reached but the effect failed, its writes were discarded
    Failed(String),
}

const ATTESTATIONS: Map<(u64, &[u8]), Attestation> = Map::new("attestations");
/// Events whose attestation was observed. Survives pruning.
const OBSERVED_EVENTS: Map<(u64, &[u8]), Empty> = Map::new("observed_events");
/// Attestation keys by creation height, for pruning
const ATTESTATIONS_BY_HEIGHT: Map<(u64, &[u8]), (u64, Binary)> =
    Map::new("attestations_by_height");

/// `nonce` in big endian followed by the claim hash.
pub fn attestation_id(nonce: u64, claim_hash: &[u8]) -> Binary {
    let mut id = nonce.to_be_bytes().to_vec();
    id.extend_from_slice(claim_hash);
    id.into()
}

/// Minimum accumulated power for quorum. Rounds down.
pub fn quorum_threshold(total_power: u64) -> u64 {
    (u128::from(total_power) * QUORUM_PERCENT / 100) as u64
}

pub fn load_attestation(
    storage: &dyn Storage,
    nonce: u64,
    claim_hash: &[u8],
) -> StdResult<Option<Attestation>> {
    ATTESTATIONS.may_load(storage, (nonce, claim_hash))
}

/// Whether the event at (`nonce`, `claim_hash`) was observed, even if its attestation was pruned.
pub fn is_observed(storage: &dyn Storage, nonce: u64, claim_hash: &[u8]) -> bool {
    OBSERVED_EVENTS.has(storage, (nonce, claim_hash))
}

pub fn save_attestation(storage: &mut dyn Storage, att: &Attestation) -> StdResult<()> {
    ATTESTATIONS.save(storage, (att.nonce, att.claim_hash.as_slice()), att)
}

/// Adds `claimer` to the voters of the attestation for (`nonce`, `claim_hash`), creating the
/// attestation on the first vote.
///
/// The returned attestation is not persisted; callers re-evaluate it with [`try_attestation`]
/// and then store it with [`save_attestation`].
pub fn vote(
    storage: &mut dyn Storage,
    powers: &dyn VotingPowerOracle,
    claim_type: &str,
    claimer: &str,
    nonce: u64,
    claim_hash: &[u8],
    height: u64,
) -> Result<Attestation, AttestationError> {
    if powers.power_of(claimer)?.is_none() {
        return Err(AttestationError::UnknownValidator(claimer.to_string()));
    }

    let mut att = match load_attestation(storage, nonce, claim_hash)? {
        Some(att) => att,
        None => {
            let id = attestation_id(nonce, claim_hash);
            ATTESTATIONS_BY_HEIGHT.save(
                storage,
                (height, id.as_slice()),
                &(nonce, Binary::from(claim_hash)),
            )?;
            Attestation {
                claim_type: claim_type.to_string(),
                nonce,
                claim_hash: Binary::from(claim_hash),
                votes: vec![],
                observed: is_observed(storage, nonce, claim_hash),
                height,
            }
        }
    };
    att.votes.push(claimer.to_string());
    Ok(att)
}

/// Errors an attestation effect can fail with.
pub trait EffectError: Display {
    /// Fatal errors reveal a broken invariant. They abort the current step instead of marking
    /// the attestation observed.
    fn is_fatal(&self) -> bool {
        false
    }
}

impl EffectError for StdError {}

impl From<AttestationError> for StdError {
    fn from(err: AttestationError) -> Self {
        match err {
            AttestationError::Std(err) => err,
            err => StdError::generic_err(err.to_string()),
        }
    }
}

/// Checks whether the voters of `att` reached quorum and, the first time they do, applies the
/// effect.
///
/// Voter power is summed in vote order against the current bonded power. The effect runs on a
/// [`StorageScope`]: its writes are committed only if it succeeds. Either way the attestation is
/// marked observed, so the effect is never evaluated again, unless the error is fatal. Fatal
/// errors are returned as is and leave the attestation unobserved.
pub fn try_attestation<T, E, F>(
    storage: &mut dyn Storage,
    powers: &dyn VotingPowerOracle,
    att: &mut Attestation,
    apply: F,
) -> Result<Tally<T>, E>
where
    F: FnOnce(&mut dyn Storage, &Attestation) -> Result<Response<T>, E>,
    E: EffectError + From<AttestationError>,
{
    if att.observed || is_observed(storage, att.nonce, &att.claim_hash) {
        att.observed = true;
        return Ok(Tally::AlreadyObserved);
    }

    let total_power = powers.total_power().map_err(AttestationError::from)?;
    if total_power == 0 {
        return Ok(Tally::Pending);
    }
    let threshold = quorum_threshold(total_power);

    let mut accumulated: u64 = 0;
    let mut reached = false;
    for voter in &att.votes {
        let power = powers.power_of(voter).map_err(AttestationError::from)?;
        // Voters that unbonded since voting count for nothing
        accumulated = accumulated.saturating_add(power.unwrap_or_default());
        if accumulated >= threshold {
            reached = true;
            break;
        }
    }
    if !reached {
        return Ok(Tally::Pending);
    }

    let tally = {
        let mut scope = StorageScope::new(storage);
        match apply(&mut scope, att) {
            Ok(effects) => {
                scope.commit();
                Tally::Observed(effects)
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => Tally::Failed(err.to_string()),
        }
    };
    att.observed = true;
    OBSERVED_EVENTS
        .save(storage, (att.nonce, att.claim_hash.as_slice()), &Empty {})
        .map_err(AttestationError::from)?;
    Ok(tally)
}

/// Deletes every attestation created below `before_height`. Claims and the observed marks of
/// their events are kept.
pub fn prune_attestations(storage: &mut dyn Storage, before_height: u64) -> StdResult<usize> {
    let stale = ATTESTATIONS_BY_HEIGHT
        .range(
            storage,
            None,
            Some(Bound::exclusive((before_height, &[] as &[u8]))),
            Order::Ascending,
        )
        .collect::<StdResult<Vec<_>>>()?;

    for ((height, id), (nonce, claim_hash)) in &stale {
        ATTESTATIONS.remove(storage, (*nonce, claim_hash.as_slice()));
        ATTESTATIONS_BY_HEIGHT.remove(storage, (*height, id.as_slice()));
    }
    Ok(stale.len())
}

pub fn observation_event(att: &Attestation, result: &str) -> Event {
    Event::new("observation")
        .add_attribute("attestation_type", &att.claim_type)
        .add_attribute("attestation_id", hex::encode(att.id()))
        .add_attribute("nonce", att.nonce.to_string())
        .add_attribute("result", result)
}
