//! Stake weighted attestation of external events.
//!
//! Validators submit claims about events they observed on the external chain. Claims that
//! describe the same event are grouped into an [`Attestation`], and once the voters of an
//! attestation hold enough voting power its effect is applied exactly once, inside a
//! [`StorageScope`] that is only committed when the effect succeeds.

mod attestation;
mod error;
mod ledger;
mod power;
mod scope;

pub use attestation::{
    attestation_id, is_observed, load_attestation, observation_event, prune_attestations,
    quorum_threshold, save_attestation, try_attestation, vote, Attestation, EffectError, Tally,
    QUORUM_PERCENT,
};
pub use error::AttestationError;
pub use ledger::{
    advance_event_nonce, claim_hash, ensure_new_claim, last_event_nonce, load_claim, record_claim,
    StoredClaim,
};
pub use power::{PowerTable, VotingPowerOracle};
pub use scope::StorageScope;
