//! Implied volatility calculation for batches of option quotes.
//!
//! Implied Volatility (IV) is the option's price translated into different
//! units: the volatility that makes the Black-Scholes price equal the
//! observed market price.
//!
//! # Batch layout
//!
//! Quotes are stored column by column in a [`QuoteBatch`], one contiguous
//! vector per field. Pricing and vega run element-wise over those columns,
//! so a single solver call advances every quote of the batch in lockstep.
//!
//! # Black-Scholes Inversion
//!
//! There is no closed-form inverse, so each quote is solved with
//! Newton-Raphson from a Brenner-Subrahmanyam starting point. Quotes whose
//! vega collapses (deep in or out of the money, or close to expiry) finish
//! by bisection, which always converges because the price is monotone in
//! volatility.
//!
//! # Failures
//!
//! Each quote gets its own [`SolverResult`]. A price outside the no-arbitrage
//! range, an exhausted iteration budget or a non-finite intermediate value
//! becomes an [`IVError`] in that quote's slot; the rest of the batch is
//! unaffected.
//!
//! # Example
//!
//! ```
//! use impliedvol_rs::volatility::implied_volatility::{ImpliedVolSolver, OptionQuote};
//!
//! let solver = ImpliedVolSolver::default();
//! let quotes = [
//!     OptionQuote::call(100.0, 100.0, 0.25, 0.01, 5.0),
//!     OptionQuote::call(100.0, 100.0, 0.25, 0.01, 150.0),
//! ];
//!
//! let results = solver.solve_quotes(&quotes);
//! assert!(results[0].is_ok());
//! assert!(results[1].is_err());
//! ```

mod batch;
mod black_scholes;
mod error;
mod solver;
mod types;

pub use batch::QuoteBatch;
pub use black_scholes::BlackScholes;
pub use error::{BatchError, FailureCode, IVError};
pub use solver::{ImpliedVolSolver, SolverConfig, solve_batch, solve_iv};
pub use types::{
    BoundConvention, CompactIVSolution, IVSolution, NoArbitrageBounds, OptionQuote, OptionType,
    SolvePath, SolverResult, narrow_results,
};
