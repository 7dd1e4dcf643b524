use cosmwasm_std::StdError;
use cw_controllers::AdminError;
use cw_utils::PaymentError;
use hub_attestation::{AttestationError, EffectError};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("Prices were submitted for epoch {submitted}, but the current epoch is {current}")]
    WrongEpoch { current: u64, submitted: u64 },
    #[error("Price {0} must be positive")]
    InvalidPrice(String),
    #[error("Price {0} was submitted more than once")]
    DuplicatePrice(String),
    #[error("Required price {0} is missing")]
    MissingPrice(String),
    #[error("Epoch length must be positive")]
    InvalidEpochLength,
    #[error("Claims window of {claims_window} blocks is shorter than an epoch of {epoch_length}")]
    InvalidClaimsWindow { claims_window: u64, epoch_length: u64 },
    #[error("Cannot migrate from contract {0}")]
    WrongContract(String),
    #[error(transparent)]
    Attestation(#[from] AttestationError),
    #[error(transparent)]
    Admin(#[from] AdminError),
    #[error(transparent)]
    Std(#[from] StdError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl EffectError for ContractError {}
