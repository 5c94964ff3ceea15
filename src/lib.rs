pub mod cli;
pub mod clock;
pub mod config;
pub mod desk;
pub mod exchange;
pub mod ledger;
pub mod logging;
pub mod store;
pub mod types;
pub mod visibility;
pub mod wire;
