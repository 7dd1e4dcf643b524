mod multitest;

pub use multitest::{
    hub_querier, mock_deps_hub, HubApp, HubAppWrapped, HubDeps, HubModule, BLOCK_TIME,
    HUB_CHAIN_ID,
};
