use impliedvol_rs::prelude::*;

#[test]
fn test_atm_call_reprices_to_five() {
    let solver = ImpliedVolSolver::default();
    let quote = OptionQuote::call(100.0, 100.0, 0.25, 0.01, 5.00);

    let solution = solver.solve(&quote).expect("ATM call should solve");

    let repriced = BlackScholes::price(&quote, solution.iv);
    assert!((repriced - 5.00).abs() <= 1e-6, "repriced to {repriced}");
    assert!(solution.iterations <= 50);
    assert!(solution.iv > 0.2 && solution.iv < 0.3);
}

#[test]
fn test_far_otm_zero_price_near_expiry() {
    let solver = ImpliedVolSolver::default();
    let quote = OptionQuote::call(100.0, 150.0, 0.01, 0.01, 0.00);
    assert_eq!(quote.bounds().lower, 0.0);

    let solution = solver
        .solve(&quote)
        .expect("zero price on the lower bound is a valid quote");

    assert_eq!(solution.iv, solver.config().min_vol);
    assert!(solution.path.contains(SolvePath::FLOORED));
    assert!(solution.path.is_degenerate());
}

#[test]
fn test_price_above_spot_is_out_of_bounds_for_both_types() {
    let solver = ImpliedVolSolver::default();
    let lenient = ImpliedVolSolver::new(
        SolverConfig::default().with_bound_convention(BoundConvention::Inclusive),
    )
    .unwrap();

    for option_type in [OptionType::Call, OptionType::Put] {
        let quote = OptionQuote::new(100.0, 100.0, 0.25, 0.01, option_type, 100.5);
        for s in [&solver, &lenient] {
            match s.solve(&quote) {
                Err(IVError::OutOfBounds { price, upper, .. }) => {
                    assert_eq!(price, 100.5);
                    assert!(upper <= 100.0);
                }
                other => panic!("{option_type:?}: expected OutOfBounds, got {other:?}"),
            }
        }
    }
}

#[test]
fn test_narrowing_happens_after_solving() {
    let solver = ImpliedVolSolver::default();
    let quote = OptionQuote::put(4200.0, 4100.0, 45.0 / 365.0, 0.045, 61.35);

    let solution = solver.solve(&quote).unwrap();
    let compact = solution.narrow();

    // the f64 solution meets the tolerance; the f32 copy only approximates it
    assert!(solution.residual.abs() < 1e-6);
    assert!((f64::from(compact.iv) - solution.iv).abs() < 1e-6);
    assert_eq!(compact.iterations, solution.iterations);
}
