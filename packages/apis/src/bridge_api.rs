/// Bridge messages / API
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Decimal, Uint128};

/// An asset that can cross the bridge.
#[cw_serde]
pub struct BridgedCoin {
    /// Denomination of the voucher on the hub chain
    pub denom: String,
    /// Identifier of the asset on the external chain (token contract or coin id)
    pub external_id: String,
    /// Decimals of the asset, identical on both sides
    pub decimals: u32,
    /// Name under which the oracle publishes the price of one whole token
    pub price_name: String,
    /// Deposit commission for this asset. Falls back to the default commission.
    pub commission: Option<Decimal>,
}

#[cw_serde]
#[derive(Default)]
pub struct InstantiateMsg {
    pub admin: Option<String>,
    /// Price oracle contract. Can be set later through `UpdateConfig`.
    pub oracle: Option<String>,
    /// Address of the bridge contract on the external chain
    pub bridge_contract: String,
    /// Chain id of the external chain
    pub bridge_chain_id: u64,
    pub coins: Vec<BridgedCoin>,
    pub min_deposit: Option<Uint128>,
    pub default_commission: Option<Decimal>,
    pub min_batch_gas: Option<u64>,
    pub batch_gas_per_tx: Option<u64>,
    pub min_single_withdraw_gas: Option<u64>,
    pub batch_size: Option<u32>,
    pub pool_entry_ttl: Option<u64>,
    pub signed_valsets_window: Option<u64>,
    pub valset_drift_threshold: Option<Decimal>,
    pub attestation_window: Option<u64>,
    pub native_price_name: Option<String>,
    pub gas_price_name: Option<String>,
}

/// Bridge parameters to change. Unset fields are left unchanged.
#[cw_serde]
#[derive(Default)]
pub struct ConfigUpdate {
    pub oracle: Option<String>,
    pub coins: Option<Vec<BridgedCoin>>,
    pub min_deposit: Option<Uint128>,
    pub default_commission: Option<Decimal>,
    pub min_batch_gas: Option<u64>,
    pub batch_gas_per_tx: Option<u64>,
    pub min_single_withdraw_gas: Option<u64>,
    pub batch_size: Option<u32>,
    pub pool_entry_ttl: Option<u64>,
    pub signed_valsets_window: Option<u64>,
    pub valset_drift_threshold: Option<Decimal>,
    pub attestation_window: Option<u64>,
}

/// External events validators attest to.
#[cw_serde]
pub enum BridgeClaim {
    /// Tokens were locked on the external chain for `receiver` on the hub.
    Deposit {
        external_id: String,
        amount: Uint128,
        /// External sender
        sender: String,
        /// Hub account credited with the vouchers
        receiver: String,
        /// External transaction hash
        tx_hash: String,
    },
    /// Tokens were locked on the external chain to be routed back out to `destination`.
    /// `fee` pays for the outgoing withdrawal; when it is too low the deposit is refunded
    /// to `sender`.
    SendToExternal {
        external_id: String,
        amount: Uint128,
        fee: Uint128,
        sender: String,
        destination: String,
        tx_hash: String,
    },
    /// A batch was executed on the external chain.
    WithdrawExecuted { batch_nonce: u64, tx_hash: String },
    /// A validator set update was executed on the external chain.
    ValsetExecuted { valset_nonce: u64 },
}

impl BridgeClaim {
    pub fn claim_type(&self) -> &'static str {
        match self {
            BridgeClaim::Deposit { .. } => "deposit",
            BridgeClaim::SendToExternal { .. } => "send_to_external",
            BridgeClaim::WithdrawExecuted { .. } => "withdraw_executed",
            BridgeClaim::ValsetExecuted { .. } => "valset_executed",
        }
    }
}

#[cw_serde]
/// hub_bridge execution handlers
pub enum ExecuteMsg {
    /// Change the admin
    UpdateAdmin { admin: Option<String> },
    /// Update bridge parameters. Admin only.
    UpdateConfig(ConfigUpdate),
    /// Stops or resumes user withdrawals and batch building. Admin only.
    SetHalted { halted: bool },
    /// Registers the key a validator signs valsets and batches with on the external chain.
    /// Only bonded validators can register.
    SetSignerKey {
        /// Address of the signer on the external chain
        external_address: String,
        /// secp256k1 public key, compressed or uncompressed
        pubkey: Binary,
    },
    /// Submits a claim about an external event. The sender is the claimer.
    SubmitClaim {
        /// Event nonce assigned by the external bridge contract
        event_nonce: u64,
        claim: BridgeClaim,
    },
    /// Confirms a validator set request with a signature over its checkpoint.
    SubmitValsetConfirm { nonce: u64, signature: Binary },
    /// Confirms a batch with a signature over its checkpoint.
    SubmitBatchConfirm { nonce: u64, signature: Binary },
    /// Withdraws the attached vouchers, minus `fee`, to `destination` on the external chain.
    SendToExternal { destination: String, fee: Uint128 },
    /// Builds a batch of the highest paying withdrawals for `denom`.
    RequestBatch { denom: String, max_size: Option<u32> },
    /// Cancels a batch and returns its withdrawals to the pool. Admin only.
    CancelBatch { nonce: u64 },
}
