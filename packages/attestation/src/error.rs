use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AttestationError {
    #[error("Claim of type {claim_type} from {claimer} at nonce {nonce} was already recorded")]
    DuplicateClaim {
        claim_type: String,
        claimer: String,
        nonce: u64,
    },
    #[error("{0} is not a bonded validator")]
    UnknownValidator(String),
    #[error("Non contiguous event nonce from {claimer}: expected {expected}, got {actual}")]
    NonContiguousNonce {
        claimer: String,
        expected: u64,
        actual: u64,
    },
    #[error(transparent)]
    Std(#[from] StdError),
}
