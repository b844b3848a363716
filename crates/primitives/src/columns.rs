//! Canonical column names of the daily panel.
//!
//! Input tables must provide the identity and market-data columns; every
//! other name is produced by a pipeline stage.

/// Asset ticker.
pub const SYMBOL: &str = "symbol";
/// Observation date.
pub const DATE: &str = "date";
/// Opening price.
pub const OPEN: &str = "open";
/// Daily high.
pub const HIGH: &str = "high";
/// Daily low.
pub const LOW: &str = "low";
/// Closing price.
pub const CLOSE: &str = "close";
/// Traded volume in currency units.
pub const VOLUME: &str = "volume";
/// Market capitalisation.
pub const MARKET_CAP: &str = "market_cap";

/// Daily log return.
pub const LOG_RETURN: &str = "log_return";
/// Daily simple return.
pub const SIMPLE_RETURN: &str = "simple_return";
/// Daily risk-free rate aligned to the panel calendar.
pub const RISK_FREE_RATE: &str = "risk_free_rate";
/// Value-weighted market return.
pub const MARKET_RETURN: &str = "market_return";
/// Asset simple return in excess of the risk-free rate.
pub const ASSET_EXCESS_RETURN: &str = "asset_excess_return";
/// Market return in excess of the risk-free rate.
pub const MARKET_EXCESS_RETURN: &str = "market_excess_return";
