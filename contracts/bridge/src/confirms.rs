//! External signer keys and checkpoint confirmations.

use cosmwasm_std::{Api, Binary, Response, Storage};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use sha3::{Digest, Keccak256};

use hub_attestation::{AttestationError, VotingPowerOracle};
use hub_bindings::HubMsg;

use crate::checkpoint::{batch_checkpoint, valset_checkpoint};
use crate::error::ContractError;
use crate::state::batch::{BATCHES, BATCH_CONFIRMS};
use crate::state::config::Config;
use crate::state::signers::{Confirm, ExternalSigner, SIGNERS, SIGNER_OWNERS};
use crate::state::valset::{VALSET_CONFIRMS, VALSET_REQUESTS};

fn ensure_bonded(powers: &dyn VotingPowerOracle, validator: &str) -> Result<(), ContractError> {
    match powers.power_of(validator)? {
        Some(_) => Ok(()),
        None => Err(AttestationError::UnknownValidator(validator.to_string()).into()),
    }
}

/// External chain address controlled by a secp256k1 key: the last 20 bytes of the keccak256
/// hash of the uncompressed point, tag byte excluded.
pub(crate) fn external_address_of(pubkey: &[u8]) -> Result<String, ContractError> {
    let key = PublicKey::from_sec1_bytes(pubkey).map_err(|_| ContractError::InvalidSignerKey)?;
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    Ok(format!("0x{}", hex::encode(&hash[12..])))
}

/// Registers the key `validator` signs checkpoints with. `external_address` must be the address
/// that key controls.
pub(crate) fn set_signer_key(
    storage: &mut dyn Storage,
    powers: &dyn VotingPowerOracle,
    validator: &str,
    external_address: &str,
    pubkey: Binary,
) -> Result<Response<HubMsg>, ContractError> {
    ensure_bonded(powers, validator)?;
    let external_address = external_address.trim().to_lowercase();
    if external_address.is_empty() {
        return Err(ContractError::InvalidSignerKey);
    }
    match (pubkey.len(), pubkey.first()) {
        (33, Some(0x02 | 0x03)) | (65, Some(0x04)) => {}
        _ => return Err(ContractError::InvalidSignerKey),
    }
    let derived = external_address_of(&pubkey)?;
    if derived != external_address {
        return Err(ContractError::SignerKeyMismatch {
            claimed: external_address,
            derived,
        });
    }

    if let Some(owner) = SIGNER_OWNERS.may_load(storage, &external_address)? {
        if owner != validator {
            return Err(ContractError::SignerTaken(external_address));
        }
    }
    if let Some(previous) = SIGNERS.may_load(storage, validator)? {
        SIGNER_OWNERS.remove(storage, &previous.external_address);
    }
    SIGNER_OWNERS.save(storage, &external_address, &validator.to_string())?;
    SIGNERS.save(
        storage,
        validator,
        &ExternalSigner {
            external_address: external_address.clone(),
            pubkey,
        },
    )?;

    Ok(Response::new()
        .add_attribute("action", "set_signer_key")
        .add_attribute("validator", validator)
        .add_attribute("external_address", external_address))
}

/// Checks `signature` against the registered key of `validator`.
fn verify_confirm(
    storage: &dyn Storage,
    api: &dyn Api,
    validator: &str,
    checkpoint: &[u8],
    signature: &[u8],
) -> Result<ExternalSigner, ContractError> {
    let signer = SIGNERS
        .may_load(storage, validator)?
        .ok_or_else(|| ContractError::NoSignerKey(validator.to_string()))?;
    match api.secp256k1_verify(checkpoint, signature, &signer.pubkey) {
        Ok(true) => Ok(signer),
        _ => Err(ContractError::InvalidSignature),
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn submit_valset_confirm(
    storage: &mut dyn Storage,
    api: &dyn Api,
    powers: &dyn VotingPowerOracle,
    cfg: &Config,
    validator: &str,
    nonce: u64,
    signature: Binary,
    height: u64,
) -> Result<Response<HubMsg>, ContractError> {
    ensure_bonded(powers, validator)?;
    let valset = VALSET_REQUESTS
        .may_load(storage, nonce)?
        .ok_or(ContractError::UnknownValset(nonce))?;
    if VALSET_CONFIRMS.has(storage, (nonce, validator)) {
        return Err(ContractError::DuplicateConfirm {
            validator: validator.to_string(),
            nonce,
        });
    }
    let checkpoint = valset_checkpoint(cfg, &valset);
    let signer = verify_confirm(storage, api, validator, &checkpoint, &signature)?;

    VALSET_CONFIRMS.save(
        storage,
        (nonce, validator),
        &Confirm {
            validator: validator.to_string(),
            external_address: signer.external_address,
            signature,
            height,
        },
    )?;
    Ok(Response::new()
        .add_attribute("action", "valset_confirm")
        .add_attribute("validator", validator)
        .add_attribute("nonce", nonce.to_string()))
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn submit_batch_confirm(
    storage: &mut dyn Storage,
    api: &dyn Api,
    powers: &dyn VotingPowerOracle,
    cfg: &Config,
    validator: &str,
    nonce: u64,
    signature: Binary,
    height: u64,
) -> Result<Response<HubMsg>, ContractError> {
    ensure_bonded(powers, validator)?;
    let batch = BATCHES
        .may_load(storage, nonce)?
        .ok_or(ContractError::UnknownBatch(nonce))?;
    if BATCH_CONFIRMS.has(storage, (nonce, validator)) {
        return Err(ContractError::DuplicateConfirm {
            validator: validator.to_string(),
            nonce,
        });
    }
    let checkpoint = batch_checkpoint(cfg, &batch);
    let signer = verify_confirm(storage, api, validator, &checkpoint, &signature)?;

    BATCH_CONFIRMS.save(
        storage,
        (nonce, validator),
        &Confirm {
            validator: validator.to_string(),
            external_address: signer.external_address,
            signature,
            height,
        },
    )?;
    Ok(Response::new()
        .add_attribute("action", "batch_confirm")
        .add_attribute("validator", validator)
        .add_attribute("nonce", nonce.to_string()))
}
