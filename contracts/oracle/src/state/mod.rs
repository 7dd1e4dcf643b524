pub mod config;
pub mod prices;
