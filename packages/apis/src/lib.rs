pub mod bridge_api;
pub mod oracle_api;

use cosmwasm_schema::cw_serde;

/// Privileged block hooks the hub chain sends to the bridge contracts.
#[cw_serde]
pub enum SudoMsg {
    /// Sent once at the end of every block. Drives all periodic maintenance.
    EndBlock {},
}
