pub use crate::cache::PriceCache;
pub use crate::volatility::historical::{
    HistoricalVolError, VolComparison, historical_volatility, historical_volatility_percent,
};
pub use crate::volatility::implied_volatility::{
    BatchError, BlackScholes, BoundConvention, CompactIVSolution, FailureCode, IVError,
    IVSolution, ImpliedVolSolver, NoArbitrageBounds, OptionQuote, OptionType, QuoteBatch,
    SolvePath, SolverConfig, SolverResult, narrow_results, solve_batch, solve_iv,
};
