pub mod batch;
pub mod config;
pub mod pool;
pub mod signers;
pub mod status;
pub mod valset;
