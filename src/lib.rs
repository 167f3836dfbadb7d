pub mod config;
pub mod dca;
pub mod db;
pub mod errors;
pub mod journal;
pub mod metrics;
pub mod server;
pub mod state;
pub mod store;
pub mod trade;
