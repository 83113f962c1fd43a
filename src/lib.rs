//! # impliedvol-rs
//!
//! Implied volatility for batches of European option quotes.
//!
//! The core is a vectorized Black-Scholes inverter: a batch of quotes is
//! stored column by column and every quote advances through Newton-Raphson
//! in lockstep, with a bisection fallback for quotes whose vega collapses.
//! Each quote yields its own result, so a bad quote never sinks a batch.
//!
//! Around the solver the crate carries two small companions:
//!
//! - [`volatility::historical`]: annualized rolling historical volatility and
//!   an implied-vs-historical comparison summary.
//! - [`cache`]: a concurrent underlying-price cache with age-based staleness.
//!
//! ## Example
//!
//! ```
//! use impliedvol_rs::prelude::*;
//!
//! let solver = ImpliedVolSolver::new(SolverConfig::default()).unwrap();
//! let quote = OptionQuote::call(100.0, 100.0, 0.25, 0.01, 5.0);
//!
//! let solution = solver.solve(&quote).unwrap();
//! let repriced = BlackScholes::price(&quote, solution.iv);
//! assert!((repriced - 5.0).abs() < 1e-6);
//! ```

pub mod cache;
/// Commonly used types and functions.
pub mod prelude;
pub mod volatility;
