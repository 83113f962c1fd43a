use impliedvol_rs::prelude::*;

const SPOTS: [f64; 2] = [50.0, 100.0];
const MONEYNESS: [f64; 5] = [0.7, 0.9, 1.0, 1.1, 1.3];
const EXPIRIES: [f64; 4] = [7.0 / 365.0, 0.25, 1.0, 2.0];
const RATES: [f64; 3] = [-0.005, 0.0, 0.05];
const VOLS: [f64; 4] = [0.08, 0.25, 0.6, 1.5];

/// Quotes priced off a known volatility, skipping those whose time value is
/// too small to identify the volatility.
fn synthetic_chain() -> Vec<(OptionQuote, f64)> {
    let mut quotes = Vec::new();
    for spot in SPOTS {
        for m in MONEYNESS {
            for t in EXPIRIES {
                for r in RATES {
                    for vol in VOLS {
                        for option_type in [OptionType::Call, OptionType::Put] {
                            let contract = OptionQuote::new(spot, spot * m, t, r, option_type, 0.0);
                            let price = BlackScholes::price(&contract, vol);
                            if price - contract.bounds().lower > 1e-3 {
                                quotes.push((contract.with_price(price), vol));
                            }
                        }
                    }
                }
            }
        }
    }
    quotes
}

#[test]
fn test_round_trip_reprices_within_tolerance() {
    let solver = ImpliedVolSolver::default();
    let chain = synthetic_chain();
    let quotes: Vec<OptionQuote> = chain.iter().map(|(q, _)| *q).collect();
    assert!(quotes.len() > 500);

    let results = solver.solve_quotes(&quotes);
    assert_eq!(results.len(), quotes.len());

    for (result, quote) in results.iter().zip(&quotes) {
        let solution = result
            .as_ref()
            .unwrap_or_else(|e| panic!("failed to solve {quote:?}: {e}"));
        let repriced = BlackScholes::price(quote, solution.iv);
        assert!(
            (repriced - quote.price).abs() <= solver.config().tolerance,
            "{quote:?} repriced to {repriced} at iv {}",
            solution.iv
        );
        assert!(solution.iterations <= solver.config().max_iterations);
    }
}

#[test]
fn test_recovers_generating_volatility_when_vega_is_material() {
    let solver = ImpliedVolSolver::default();
    for (quote, vol) in synthetic_chain() {
        if BlackScholes::vega(&quote, vol) < 1.0 {
            continue;
        }
        let solution = solver.solve(&quote).unwrap();
        assert!(
            (solution.iv - vol).abs() < 1e-5,
            "{quote:?}: expected {vol}, got {}",
            solution.iv
        );
    }
}

#[test]
fn test_shuffled_batch_gives_same_per_quote_results() {
    let solver = ImpliedVolSolver::default();
    let mut quotes: Vec<OptionQuote> = synthetic_chain().into_iter().map(|(q, _)| q).collect();
    // a few failures mixed in
    quotes.push(OptionQuote::call(100.0, 100.0, 0.25, 0.01, 101.0));
    quotes.push(OptionQuote::put(100.0, 100.0, 0.0, 0.01, 3.0));
    quotes.push(OptionQuote::call(100.0, 150.0, 0.01, 0.01, 0.0));

    let baseline = solver.solve_quotes(&quotes);

    // deterministic permutation: stride through the batch with a step coprime to its length
    let n = quotes.len();
    let mut step = 7;
    while gcd(step, n) != 1 {
        step += 1;
    }
    let order: Vec<usize> = (0..n).map(|i| (i * step) % n).collect();
    let shuffled: Vec<OptionQuote> = order.iter().map(|&i| quotes[i]).collect();

    let permuted = solver.solve_quotes(&shuffled);

    for (position, &original) in order.iter().enumerate() {
        assert_eq!(permuted[position], baseline[original]);
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}

#[test]
fn test_failures_do_not_abort_batch() {
    let solver = ImpliedVolSolver::default();
    let good = OptionQuote::call(100.0, 100.0, 0.5, 0.02, 8.0);
    let quotes = [
        good,
        OptionQuote::call(100.0, 100.0, 0.5, 0.02, 120.0),
        OptionQuote::call(f64::NAN, 100.0, 0.5, 0.02, 8.0),
        good,
    ];

    let results = solver.solve_quotes(&quotes);

    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().code(), FailureCode::OutOfBounds);
    assert_eq!(
        results[2].as_ref().unwrap_err().code(),
        FailureCode::NumericalInstability
    );
    assert_eq!(results[3], results[0]);
}

#[test]
fn test_columns_with_mismatched_lengths_fault_the_batch() {
    let err = QuoteBatch::from_columns(
        vec![100.0; 3],
        vec![90.0, 100.0, 110.0],
        vec![0.25; 3],
        vec![0.01; 3],
        vec![OptionType::Call; 2],
        vec![11.0, 5.0, 1.5],
    )
    .unwrap_err();

    assert_eq!(
        err,
        BatchError::LengthMismatch {
            field: "option_type",
            expected: 3,
            actual: 2,
        }
    );
}

#[test]
fn test_column_batch_matches_row_solve() {
    let batch = QuoteBatch::from_columns(
        vec![100.0; 3],
        vec![90.0, 100.0, 110.0],
        vec![0.25; 3],
        vec![0.01; 3],
        vec![OptionType::Call, OptionType::Call, OptionType::Put],
        vec![11.5, 5.0, 11.2],
    )
    .unwrap();

    let config = SolverConfig::default();
    let from_columns = solve_batch(&batch, &config).unwrap();
    let from_rows: Vec<SolverResult> = batch
        .iter()
        .map(|quote| solve_iv(&quote, &config).unwrap())
        .collect();

    assert_eq!(from_columns, from_rows);
}

#[test]
fn test_iteration_budget_bounds_work() {
    let config = SolverConfig::default().with_max_iterations(2).with_tolerance(1e-13);
    let solver = ImpliedVolSolver::new(config).unwrap();
    let quotes: Vec<OptionQuote> = synthetic_chain().into_iter().map(|(q, _)| q).collect();

    for result in solver.solve_quotes(&quotes) {
        match result {
            Ok(solution) => assert!(solution.iterations <= 2),
            Err(IVError::NonConvergence { iterations, .. }) => assert!(iterations <= 2),
            Err(other) => panic!("unexpected failure {other}"),
        }
    }
}

#[test]
fn test_results_serialize_for_downstream_storage() {
    let solver = ImpliedVolSolver::default();
    let results = solver.solve_quotes(&[
        OptionQuote::call(100.0, 100.0, 0.25, 0.01, 5.0),
        OptionQuote::call(100.0, 100.0, 0.25, 0.01, 150.0),
    ]);

    let narrowed = narrow_results(&results);
    let json = serde_json::to_string(&narrowed).unwrap();
    assert!(json.contains("OutOfBounds"));

    let back: Vec<Result<CompactIVSolution, FailureCode>> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 2);
    let stored = back[0].unwrap();
    let solved = results[0].as_ref().unwrap();
    assert!((f64::from(stored.iv) - solved.iv).abs() < 1e-6);
    assert_eq!(stored.path, solved.path);
    assert_eq!(back[1], Err(FailureCode::OutOfBounds));
}
