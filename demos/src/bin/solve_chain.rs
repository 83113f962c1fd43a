//! Solves implied volatility for a small option chain and prints the smile.
//!
//! This example shows how to:
//! 1. Load solver settings from JSON
//! 2. Build a column batch for one (underlying, expiry) pair
//! 3. Read per-quote results, including failures, without aborting the chain
//! 4. Narrow results to single precision for storage

use impliedvol_rs::prelude::*;
use std::time::Duration;
use tracing::{error, info, warn};

const SETTINGS: &str = r#"{
    "max_iterations": 60,
    "tolerance": 1e-7,
    "bound_convention": "Strict"
}"#;

fn main() {
    tracing_subscriber::fmt::init();

    let config = match SolverConfig::from_json(SETTINGS) {
        Ok(config) => config,
        Err(e) => {
            error!("Bad solver settings: {}", e);
            return;
        }
    };
    let solver = match ImpliedVolSolver::new(config) {
        Ok(solver) => solver,
        Err(e) => {
            error!("Cannot build solver: {}", e);
            return;
        }
    };

    let spots = PriceCache::new(Duration::from_secs(60));
    let spot = spots.get_or_insert_with("QQQ", 1_718_380_800, || 479.19);
    let expiry = 28.0 / 365.0;
    let rate = 0.052;

    // mid prices for one expiry; the last row is deliberately crossed
    let rows = [
        (440.0, OptionType::Put, 2.31),
        (460.0, OptionType::Put, 5.12),
        (480.0, OptionType::Call, 11.04),
        (500.0, OptionType::Call, 3.86),
        (520.0, OptionType::Call, 0.98),
        (480.0, OptionType::Call, 481.00),
    ];

    let batch: QuoteBatch = rows
        .iter()
        .map(|&(strike, option_type, price)| {
            OptionQuote::new(spot, strike, expiry, rate, option_type, price)
        })
        .collect();

    let results = solver.solve_batch(&batch);

    for (quote, result) in batch.iter().zip(&results) {
        match result {
            Ok(solution) => info!(
                "{:?} {:>6.1}: iv {:>6.2}% after {} iterations ({:?})",
                quote.option_type,
                quote.strike,
                solution.iv_percent(),
                solution.iterations,
                solution.path
            ),
            Err(e) => warn!("{:?} {:>6.1}: {}", quote.option_type, quote.strike, e),
        }
    }

    let stored = narrow_results(&results);
    match serde_json::to_string_pretty(&stored) {
        Ok(json) => info!("Narrowed results:\n{}", json),
        Err(e) => error!("Failed to serialize results: {}", e),
    }
}
