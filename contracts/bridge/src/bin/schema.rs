use cosmwasm_schema::write_api;

use hub_bridge::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};

fn main() {
    write_api! {
        instantiate: InstantiateMsg,
        query: QueryMsg,
        migrate: MigrateMsg,
        execute: ExecuteMsg,
    }
}
