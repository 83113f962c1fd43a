use impliedvol_rs::prelude::*;

fn strict() -> ImpliedVolSolver {
    ImpliedVolSolver::default()
}

fn inclusive() -> ImpliedVolSolver {
    ImpliedVolSolver::new(SolverConfig::default().with_bound_convention(BoundConvention::Inclusive))
        .unwrap()
}

#[test]
fn test_lower_bound_maps_to_min_vol() {
    for option_type in [OptionType::Call, OptionType::Put] {
        let contract = OptionQuote::new(100.0, 100.0, 0.25, 0.01, option_type, 0.0);
        let quote = contract.with_price(contract.bounds().lower);

        for solver in [strict(), inclusive()] {
            let solution = solver.solve(&quote).unwrap();
            assert_eq!(solution.iv, solver.config().min_vol);
            assert!(solution.path.contains(SolvePath::FLOORED));
            assert!(solution.residual.abs() <= solver.config().tolerance);
        }
    }
}

#[test]
fn test_below_lower_bound_is_rejected() {
    // ITM call: lower bound is S - K·e^(-rT)
    let contract = OptionQuote::call(110.0, 100.0, 0.5, 0.02, 0.0);
    let quote = contract.with_price(contract.bounds().lower - 0.01);

    for solver in [strict(), inclusive()] {
        let err = solver.solve(&quote).unwrap_err();
        assert_eq!(err.code(), FailureCode::OutOfBounds);
    }
}

#[test]
fn test_upper_bound_strict_convention() {
    let call = OptionQuote::call(100.0, 100.0, 0.25, 0.01, 100.0);
    let put_contract = OptionQuote::put(100.0, 100.0, 0.25, 0.01, 0.0);
    let put = put_contract.with_price(put_contract.bounds().upper);

    for quote in [call, put] {
        let err = strict().solve(&quote).unwrap_err();
        assert_eq!(err.code(), FailureCode::OutOfBounds);
    }
}

#[test]
fn test_upper_bound_inclusive_convention() {
    let call = OptionQuote::call(100.0, 100.0, 0.25, 0.01, 100.0);
    let put_contract = OptionQuote::put(100.0, 100.0, 0.25, 0.01, 0.0);
    let put = put_contract.with_price(put_contract.bounds().upper);

    let solver = inclusive();
    for quote in [call, put] {
        let solution = solver.solve(&quote).unwrap();
        assert_eq!(solution.iv, solver.config().max_vol);
        assert!(solution.path.contains(SolvePath::CAPPED));
    }
}

#[test]
fn test_out_of_bounds_never_iterates() {
    let solver = strict();
    let results = solver.solve_quotes(&[
        OptionQuote::call(100.0, 100.0, 0.25, 0.01, 250.0),
        OptionQuote::put(100.0, 90.0, 0.25, 0.01, -0.5),
    ]);
    for result in results {
        match result {
            Err(IVError::OutOfBounds { lower, upper, .. }) => assert!(lower <= upper),
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
    }
}

#[test]
fn test_price_above_max_vol_reach_does_not_converge() {
    // admissible (below S) but worth more than BS at max_vol
    let quote = OptionQuote::call(100.0, 100.0, 0.25, 0.01, 90.0);

    for solver in [strict(), inclusive()] {
        let max_vol = solver.config().max_vol;
        let at_max = BlackScholes::price(&quote, max_vol);
        assert!(at_max < quote.price && quote.price < quote.bounds().upper);

        match solver.solve(&quote) {
            Err(IVError::NonConvergence {
                iterations,
                last_iv,
                residual,
            }) => {
                assert_eq!(iterations, 0);
                assert_eq!(last_iv, max_vol);
                assert!((residual - (at_max - quote.price)).abs() < 1e-12);
            }
            other => panic!("expected NonConvergence, got {other:?}"),
        }
    }
}

#[test]
fn test_price_below_min_vol_reach_does_not_converge() {
    let config = SolverConfig::default().with_bounds(0.1, 5.0);
    let solver = ImpliedVolSolver::new(config).unwrap();
    let contract = OptionQuote::call(100.0, 100.0, 0.25, 0.01, 0.0);
    let at_min = BlackScholes::price(&contract, 0.1);

    // strictly between the lower bound and BS(min_vol)
    let quote = contract.with_price(1.0);
    assert!(contract.bounds().lower < quote.price && quote.price < at_min);
    match solver.solve(&quote) {
        Err(IVError::NonConvergence {
            iterations,
            last_iv,
            residual,
        }) => {
            assert_eq!(iterations, 0);
            assert_eq!(last_iv, 0.1);
            assert!(residual > 0.0);
        }
        other => panic!("expected NonConvergence, got {other:?}"),
    }

    // the lower bound itself still pins to min_vol
    let on_lower = contract.with_price(contract.bounds().lower);
    let solution = solver.solve(&on_lower).unwrap();
    assert_eq!(solution.iv, 0.1);
    assert!(solution.path.contains(SolvePath::FLOORED));
}

#[test]
fn test_price_at_max_vol_is_capped() {
    let contract = OptionQuote::call(100.0, 100.0, 0.25, 0.01, 0.0);
    let solver = strict();
    let quote = contract.with_price(BlackScholes::price(&contract, solver.config().max_vol));

    let solution = solver.solve(&quote).unwrap();
    assert_eq!(solution.iv, solver.config().max_vol);
    assert!(solution.path.contains(SolvePath::CAPPED));
    assert!(solution.residual.abs() <= solver.config().tolerance);
}

#[test]
fn test_vanishing_vega_falls_back_to_bisection() {
    // deep OTM, one week: the initial guess is so low that vega underflows
    let contract = OptionQuote::call(100.0, 200.0, 0.01, 0.0, 0.0);
    let quote = contract.with_price(BlackScholes::price(&contract, 1.9));
    let solver = strict();

    let guess = (2.0 * std::f64::consts::PI / 0.01).sqrt() * quote.price / 100.0;
    assert!(BlackScholes::vega(&quote, guess) < solver.config().vega_floor);

    let solution = solver.solve(&quote).unwrap();
    assert!(solution.path.contains(SolvePath::BISECTION));
    let repriced = BlackScholes::price(&quote, solution.iv);
    assert!((repriced - quote.price).abs() < solver.config().tolerance);
    assert!((solution.iv - 1.9).abs() < 1e-3);
}
