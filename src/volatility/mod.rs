//! Volatility estimation: implied from option prices, historical from closes.

pub mod historical;
pub mod implied_volatility;

pub use historical::{
    HistoricalVolError, VolComparison, historical_volatility, historical_volatility_percent,
};
