use cosmwasm_std::{ConversionOverflowError, DivideByZeroError, OverflowError, StdError, Uint256};
use cw_controllers::AdminError;
use cw_utils::PaymentError;
use hub_attestation::{AttestationError, EffectError};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("The bridge is halted")]
    BridgeHalted,
    #[error("Amount must be positive")]
    InvalidAmount,
    #[error("Amount {amount} is below the minimum deposit of {minimum}")]
    AmountBelowMinimum { amount: String, minimum: String },
    #[error("Unknown external asset {0}")]
    UnknownCoin(String),
    #[error("Unknown denom {0}")]
    UnknownDenom(String),
    #[error("Destination address must not be empty")]
    InvalidDestination,
    #[error("Batch size must be positive")]
    InvalidBatchSize,
    #[error("No withdrawals of {0} are waiting to be batched")]
    EmptyBatch(String),
    #[error("Batch fees worth {fees} do not cover the execution cost of {cost}")]
    InsufficientGas { fees: Uint256, cost: Uint256 },
    #[error("Fee worth {value} does not cover the execution cost of {cost}")]
    InsufficientFee { value: Uint256, cost: Uint256 },
    #[error("No price published for {0}")]
    PriceNotFound(String),
    #[error("No price oracle is configured")]
    OracleNotSet,
    #[error("Malformed claim: {0}")]
    InvalidClaim(String),
    #[error("Unknown batch {0}")]
    UnknownBatch(u64),
    #[error("Unknown valset {0}")]
    UnknownValset(u64),
    #[error("Validator {validator} already confirmed nonce {nonce}")]
    DuplicateConfirm { validator: String, nonce: u64 },
    #[error("Validator {0} has no registered signer key")]
    NoSignerKey(String),
    #[error("External address {0} is already registered by another validator")]
    SignerTaken(String),
    #[error("Invalid secp256k1 public key")]
    InvalidSignerKey,
    #[error("External address {claimed} does not match the signer key, which derives {derived}")]
    SignerKeyMismatch { claimed: String, derived: String },
    #[error("Signature does not match the checkpoint")]
    InvalidSignature,
    #[error("Pool entry {0} is missing")]
    MissingPoolEntry(u64),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
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
    #[error(transparent)]
    Overflow(#[from] OverflowError),
    #[error(transparent)]
    ConversionOverflow(#[from] ConversionOverflowError),
    #[error(transparent)]
    DivideByZero(#[from] DivideByZeroError),
}

impl EffectError for ContractError {
    fn is_fatal(&self) -> bool {
        matches!(self, ContractError::MissingPoolEntry(_))
    }
}
