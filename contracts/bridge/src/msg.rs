use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Binary, Uint128};
#[cfg(not(target_arch = "wasm32"))]
use {
    crate::state::config::Config, crate::state::signers::ExternalSigner,
    crate::state::status::TxStatusRecord, cw_controllers::AdminResponse,
    hub_attestation::Attestation,
};

use crate::state::batch::OutgoingTxBatch;
use crate::state::pool::OutgoingTx;
use crate::state::signers::Confirm;
use crate::state::valset::Valset;

pub type InstantiateMsg = hub_apis::bridge_api::InstantiateMsg;
pub type ExecuteMsg = hub_apis::bridge_api::ExecuteMsg;

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Returns the current configuration of the bridge contract.
    #[returns(Config)]
    Config {},
    /// Returns the current admin of the contract.
    #[returns(AdminResponse)]
    Admin {},
    /// Returns the last valset executed on the external chain, if any.
    #[returns(Option<Valset>)]
    CurrentValset {},
    /// Returns the pending valset request with the given nonce.
    #[returns(Option<Valset>)]
    ValsetRequest { nonce: u64 },
    /// Returns the pending valset requests `validator` has not confirmed yet, oldest first.
    #[returns(ValsetsResponse)]
    PendingValsets { validator: String },
    /// Returns the confirms received for valset `nonce`.
    #[returns(ConfirmsResponse)]
    ValsetConfirms {
        nonce: u64,
        start_after: Option<String>,
        limit: Option<u32>,
    },
    /// Returns the batch with the given nonce.
    #[returns(Option<OutgoingTxBatch>)]
    Batch { nonce: u64 },
    /// Lists the batches waiting to be executed, by nonce.
    #[returns(BatchesResponse)]
    Batches {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// Returns the oldest batch `validator` has not confirmed yet.
    #[returns(Option<OutgoingTxBatch>)]
    PendingBatch { validator: String },
    /// Returns the confirms received for batch `nonce`.
    #[returns(ConfirmsResponse)]
    BatchConfirms {
        nonce: u64,
        start_after: Option<String>,
        limit: Option<u32>,
    },
    /// Returns the attestation of the event at `event_nonce` with the given claim hash.
    #[returns(Option<Attestation>)]
    Attestation {
        event_nonce: u64,
        claim_hash: Binary,
    },
    /// Returns the last event nonce accepted from `validator`.
    #[returns(NonceResponse)]
    LastEventNonce { validator: String },
    /// Returns the highest event nonce that was observed.
    #[returns(NonceResponse)]
    LastObservedNonce {},
    /// Lists the withdrawals of `denom` waiting to be batched, highest fee first.
    #[returns(PoolResponse)]
    OutgoingPool { denom: String, limit: Option<u32> },
    /// Returns the status of a bridged transaction, by originating transaction hash.
    #[returns(Option<TxStatusRecord>)]
    TxStatus { tx_hash: String },
    /// Returns the external signer registered by `validator`.
    #[returns(Option<ExternalSigner>)]
    SignerKey { validator: String },
    /// Returns the minimal fees for withdrawing `denom` at current prices.
    #[returns(FeeEstimateResponse)]
    FeeEstimate { denom: String },
    /// Returns the digest validators sign to confirm valset `nonce`.
    #[returns(CheckpointResponse)]
    ValsetCheckpoint { nonce: u64 },
    /// Returns the digest validators sign to confirm batch `nonce`.
    #[returns(CheckpointResponse)]
    BatchCheckpoint { nonce: u64 },
}

#[cw_serde]
pub struct ValsetsResponse {
    pub valsets: Vec<Valset>,
}

#[cw_serde]
pub struct BatchesResponse {
    pub batches: Vec<OutgoingTxBatch>,
}

#[cw_serde]
pub struct ConfirmsResponse {
    pub confirms: Vec<Confirm>,
}

#[cw_serde]
pub struct PoolResponse {
    pub transactions: Vec<OutgoingTx>,
}

#[cw_serde]
pub struct NonceResponse {
    pub nonce: u64,
}

#[cw_serde]
pub struct CheckpointResponse {
    /// sha256 digest
    pub checkpoint: Binary,
}

#[cw_serde]
pub struct FeeEstimateResponse {
    pub denom: String,
    /// Smallest fee accepted by `SendToExternal`, in base units of `denom`
    pub min_withdraw_fee: Uint128,
    /// Smallest total fee for a batch with a single withdrawal
    pub min_batch_fee: Uint128,
}
