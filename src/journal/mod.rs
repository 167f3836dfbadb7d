pub mod export;
pub mod filter;
pub mod format;

pub use filter::TradeFilter;
