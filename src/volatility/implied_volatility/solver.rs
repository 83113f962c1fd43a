//! Vectorized Newton-Raphson solver for implied volatility.
//!
//! Every quote of a batch is a lane. Each round evaluates price and vega for
//! all live lanes at once, then advances each lane independently: converged
//! lanes freeze, lanes whose vega collapses below the floor switch to
//! bisection, and everything else takes a damped Newton step inside its
//! monotone bracket. The number of rounds is bounded by `max_iterations`.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::batch::QuoteBatch;
use super::black_scholes::BlackScholes;
use super::error::{BatchError, IVError};
use super::types::{BoundConvention, IVSolution, OptionQuote, SolvePath, SolverResult};

/// Largest volatility change a single Newton step may apply.
const MAX_NEWTON_STEP: f64 = 0.5;

/// Configuration for the implied volatility solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum iterations per quote before giving up.
    pub max_iterations: u32,
    /// Convergence tolerance on the absolute price residual.
    pub tolerance: f64,
    /// Minimum IV bound (default: 0.0001 = 0.01%).
    pub min_vol: f64,
    /// Maximum IV bound (default: 5.0 = 500%).
    pub max_vol: f64,
    /// Vega below which a quote leaves Newton-Raphson for bisection.
    pub vega_floor: f64,
    /// Treatment of a price sitting exactly on the upper bound.
    pub bound_convention: BoundConvention,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            min_vol: 1e-4,
            max_vol: 5.0,
            vega_floor: 1e-8,
            bound_convention: BoundConvention::Strict,
        }
    }
}

impl SolverConfig {
    /// Creates a new solver configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the IV bounds.
    #[must_use]
    pub fn with_bounds(mut self, min_vol: f64, max_vol: f64) -> Self {
        self.min_vol = min_vol;
        self.max_vol = max_vol;
        self
    }

    /// Sets the vega floor that triggers the bisection fallback.
    #[must_use]
    pub fn with_vega_floor(mut self, vega_floor: f64) -> Self {
        self.vega_floor = vega_floor;
        self
    }

    /// Sets the upper-bound convention.
    #[must_use]
    pub fn with_bound_convention(mut self, bound_convention: BoundConvention) -> Self {
        self.bound_convention = bound_convention;
        self
    }

    /// Checks that the configuration can produce meaningful results.
    ///
    /// # Errors
    /// Returns [`BatchError::InvalidConfig`] describing the first bad setting.
    pub fn validate(&self) -> Result<(), BatchError> {
        let message = if self.max_iterations == 0 {
            Some("max_iterations must be positive".to_string())
        } else if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            Some(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            ))
        } else if !(self.vega_floor.is_finite() && self.vega_floor > 0.0) {
            Some(format!(
                "vega_floor must be positive and finite, got {}",
                self.vega_floor
            ))
        } else if !(self.min_vol.is_finite() && self.min_vol > 0.0) {
            Some(format!(
                "min_vol must be positive and finite, got {}",
                self.min_vol
            ))
        } else if !(self.max_vol.is_finite() && self.max_vol > self.min_vol) {
            Some(format!(
                "max_vol must be finite and above min_vol {}, got {}",
                self.min_vol, self.max_vol
            ))
        } else {
            None
        };

        match message {
            Some(message) => {
                warn!("rejecting solver configuration: {}", message);
                Err(BatchError::InvalidConfig { message })
            }
            None => Ok(()),
        }
    }

    /// Parses and validates a configuration from JSON. Missing fields take
    /// their default values.
    ///
    /// # Errors
    /// Returns [`BatchError::InvalidConfig`] on malformed JSON or invalid values.
    pub fn from_json(json: &str) -> Result<Self, BatchError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BatchError::InvalidConfig {
                message: format!("failed to parse configuration: {e}"),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to JSON.
    ///
    /// # Errors
    /// Returns [`BatchError::InvalidConfig`] if serialization fails.
    pub fn to_json(&self) -> Result<String, BatchError> {
        serde_json::to_string(self).map_err(|e| BatchError::InvalidConfig {
            message: format!("failed to serialize configuration: {e}"),
        })
    }
}

/// Brenner-Subrahmanyam starting point: σ ≈ √(2π/T) · P / S.
fn initial_guess(spot: f64, time_to_expiry: f64, price: f64, config: &SolverConfig) -> f64 {
    let guess = (2.0 * std::f64::consts::PI / time_to_expiry).sqrt() * price / spot;
    if guess.is_finite() {
        guess.clamp(config.min_vol, config.max_vol)
    } else {
        0.5 * (config.min_vol + config.max_vol)
    }
}

/// Stage of a lane in the iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    Newton,
    Bisection,
    Done,
}

/// Working arrays for one batch solve, one entry per quote.
struct LaneState {
    lane: Vec<Lane>,
    active: Vec<bool>,
    vol: Vec<f64>,
    lo: Vec<f64>,
    hi: Vec<f64>,
    last_vol: Vec<f64>,
    last_residual: Vec<f64>,
    iterations: Vec<u32>,
    path: Vec<SolvePath>,
    prices: Vec<f64>,
    vegas: Vec<f64>,
    results: Vec<Option<SolverResult>>,
}

impl LaneState {
    fn new(len: usize, config: &SolverConfig) -> Self {
        Self {
            lane: vec![Lane::Done; len],
            active: vec![false; len],
            vol: vec![config.min_vol; len],
            lo: vec![config.min_vol; len],
            hi: vec![config.max_vol; len],
            last_vol: vec![f64::NAN; len],
            last_residual: vec![f64::NAN; len],
            iterations: vec![0; len],
            path: vec![SolvePath::empty(); len],
            prices: vec![0.0; len],
            vegas: vec![0.0; len],
            results: vec![None; len],
        }
    }

    fn finish(&mut self, index: usize, result: SolverResult) {
        self.lane[index] = Lane::Done;
        self.active[index] = false;
        self.results[index] = Some(result);
    }

    fn start(&mut self, index: usize, vol: f64) {
        self.lane[index] = Lane::Newton;
        self.active[index] = true;
        self.vol[index] = vol;
    }

    fn live_count(&self) -> usize {
        self.active.iter().filter(|on| **on).count()
    }
}

/// Solves implied volatility for whole batches of quotes.
///
/// The solver holds only its configuration; every call is independent, so a
/// single instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct ImpliedVolSolver {
    config: SolverConfig,
}

impl ImpliedVolSolver {
    /// Creates a solver after validating `config`.
    ///
    /// # Errors
    /// Returns [`BatchError::InvalidConfig`] if the configuration is unusable.
    pub fn new(config: SolverConfig) -> Result<Self, BatchError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves a single quote.
    pub fn solve(&self, quote: &OptionQuote) -> SolverResult {
        let batch = QuoteBatch::from_quotes(std::slice::from_ref(quote));
        self.solve_batch(&batch)
            .pop()
            .unwrap_or_else(|| Err(instability(0, "empty result for single quote")))
    }

    /// Solves row-oriented quotes, returning results in input order.
    #[must_use]
    pub fn solve_quotes(&self, quotes: &[OptionQuote]) -> Vec<SolverResult> {
        self.solve_batch(&QuoteBatch::from_quotes(quotes))
    }

    /// Solves every quote of `batch`, returning results in input order.
    ///
    /// A failing quote never affects the others; its slot carries an
    /// [`IVError`] instead of a solution.
    #[must_use]
    pub fn solve_batch(&self, batch: &QuoteBatch) -> Vec<SolverResult> {
        let config = &self.config;
        let mut state = LaneState::new(batch.len(), config);

        self.screen(batch, &mut state);
        let screened = batch.len() - state.live_count();

        let mut rounds = 0;
        while rounds < config.max_iterations && state.active.iter().any(|on| *on) {
            rounds += 1;
            BlackScholes::price_and_vega_batch_into(
                batch,
                &state.vol,
                &state.active,
                &mut state.prices,
                &mut state.vegas,
            );

            for i in 0..batch.len() {
                if state.active[i] {
                    self.advance(i, batch.price()[i], &mut state);
                }
            }
        }

        for i in 0..batch.len() {
            if state.active[i] {
                let error = IVError::NonConvergence {
                    iterations: state.iterations[i],
                    last_iv: state.last_vol[i],
                    residual: state.last_residual[i],
                };
                trace!("lane {}: {}", i, error);
                state.finish(i, Err(error));
            }
        }

        let results: Vec<SolverResult> = state
            .results
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err(instability(0, "lane never resolved"))))
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        debug!(
            "solved batch of {} quotes: {} solved, {} failed, {} resolved before iterating, {} rounds",
            results.len(),
            results.len() - failed,
            failed,
            screened,
            rounds
        );

        results
    }

    /// Settles every quote that needs no iteration and seeds the others.
    ///
    /// Invalid inputs, bound violations, expired contracts and prices at the
    /// edges of the volatility range are resolved here; Newton-Raphson never
    /// sees them.
    fn screen(&self, batch: &QuoteBatch, state: &mut LaneState) {
        let config = &self.config;
        let n = batch.len();

        let mut at_min = vec![0.0; n];
        let mut at_max = vec![0.0; n];
        BlackScholes::price_batch_into(batch, &vec![config.min_vol; n], &mut at_min);
        BlackScholes::price_batch_into(batch, &vec![config.max_vol; n], &mut at_max);

        for (i, quote) in batch.iter().enumerate() {
            let inputs_valid = quote.spot.is_finite()
                && quote.strike.is_finite()
                && quote.time_to_expiry.is_finite()
                && quote.risk_free_rate.is_finite()
                && quote.price.is_finite()
                && quote.spot > 0.0
                && quote.strike > 0.0
                && quote.time_to_expiry >= 0.0;
            if !inputs_valid {
                state.finish(i, Err(instability(0, "invalid quote field")));
                continue;
            }

            let bounds = quote.bounds();

            if quote.time_to_expiry == 0.0 {
                let residual = bounds.lower - quote.price;
                let result = if residual.abs() <= config.tolerance {
                    Ok(IVSolution {
                        iv: config.min_vol,
                        iterations: 0,
                        residual,
                        path: SolvePath::EXPIRED | SolvePath::FLOORED,
                    })
                } else {
                    Err(IVError::OutOfBounds {
                        price: quote.price,
                        lower: bounds.lower,
                        upper: bounds.upper,
                    })
                };
                state.finish(i, result);
                continue;
            }

            if !bounds.admits(quote.price, config.bound_convention) {
                trace!(
                    "lane {}: price {} outside [{}, {}]",
                    i, quote.price, bounds.lower, bounds.upper
                );
                state.finish(
                    i,
                    Err(IVError::OutOfBounds {
                        price: quote.price,
                        lower: bounds.lower,
                        upper: bounds.upper,
                    }),
                );
                continue;
            }

            if !(at_min[i].is_finite() && at_max[i].is_finite()) {
                state.finish(i, Err(instability(0, "price at volatility bound is not finite")));
                continue;
            }

            // the volatility range cannot reach prices below BS(min_vol) or above
            // BS(max_vol); only the bounds themselves pin to an edge
            if quote.price <= at_min[i] + config.tolerance {
                let residual = at_min[i] - quote.price;
                let result = if residual.abs() <= config.tolerance || quote.price == bounds.lower {
                    Ok(IVSolution {
                        iv: config.min_vol,
                        iterations: 0,
                        residual,
                        path: SolvePath::FLOORED,
                    })
                } else {
                    Err(IVError::NonConvergence {
                        iterations: 0,
                        last_iv: config.min_vol,
                        residual,
                    })
                };
                state.finish(i, result);
                continue;
            }

            if quote.price >= at_max[i] - config.tolerance {
                let residual = at_max[i] - quote.price;
                let on_upper = config.bound_convention == BoundConvention::Inclusive
                    && quote.price == bounds.upper;
                let result = if residual.abs() <= config.tolerance || on_upper {
                    Ok(IVSolution {
                        iv: config.max_vol,
                        iterations: 0,
                        residual,
                        path: SolvePath::CAPPED,
                    })
                } else {
                    Err(IVError::NonConvergence {
                        iterations: 0,
                        last_iv: config.max_vol,
                        residual,
                    })
                };
                state.finish(i, result);
                continue;
            }

            let guess = initial_guess(quote.spot, quote.time_to_expiry, quote.price, config);
            state.start(i, guess);
        }
    }

    /// Advances lane `i` after its price and vega were evaluated.
    fn advance(&self, i: usize, target: f64, state: &mut LaneState) {
        let config = &self.config;
        let vol = state.vol[i];
        let residual = state.prices[i] - target;

        state.iterations[i] += 1;
        let iterations = state.iterations[i];

        if !residual.is_finite() {
            state.finish(i, Err(instability(iterations, "residual is not finite")));
            return;
        }

        state.last_vol[i] = vol;
        state.last_residual[i] = residual;

        if residual.abs() < config.tolerance {
            state.finish(
                i,
                Ok(IVSolution {
                    iv: vol,
                    iterations,
                    residual,
                    path: state.path[i],
                }),
            );
            return;
        }

        // price is increasing in vol, so the residual sign tells which side the root is on
        if residual > 0.0 {
            state.hi[i] = vol;
        } else {
            state.lo[i] = vol;
        }
        let (lo, hi) = (state.lo[i], state.hi[i]);
        let mid = 0.5 * (lo + hi);

        let lane = state.lane[i];
        match lane {
            Lane::Newton if state.vegas[i] < config.vega_floor => {
                trace!(
                    "lane {}: vega {:.3e} below floor, bisecting [{}, {}]",
                    i, state.vegas[i], lo, hi
                );
                state.lane[i] = Lane::Bisection;
                state.path[i] |= SolvePath::BISECTION;
                state.vol[i] = mid;
            }
            Lane::Newton => {
                let step = (residual / state.vegas[i]).clamp(-MAX_NEWTON_STEP, MAX_NEWTON_STEP);
                let next = vol - step;
                if !next.is_finite() {
                    state.finish(i, Err(instability(iterations, "volatility is not finite")));
                    return;
                }
                state.path[i] |= SolvePath::NEWTON;
                if next <= lo || next >= hi {
                    state.path[i] |= SolvePath::SAFEGUARDED;
                    state.vol[i] = mid;
                } else {
                    state.vol[i] = next;
                }
            }
            Lane::Bisection => {
                // the price-space width is bounded by the residual test above;
                // this catches a vol bracket that can no longer be split
                if hi - lo <= f64::EPSILON * hi {
                    state.finish(
                        i,
                        Ok(IVSolution {
                            iv: vol,
                            iterations,
                            residual,
                            path: state.path[i],
                        }),
                    );
                } else {
                    state.vol[i] = mid;
                }
            }
            Lane::Done => {}
        }
    }
}

fn instability(iterations: u32, detail: &str) -> IVError {
    IVError::NumericalInstability {
        iterations,
        detail: detail.to_string(),
    }
}

/// Validates `config` and solves `batch` with it.
///
/// # Errors
/// Returns [`BatchError::InvalidConfig`] if the configuration is unusable.
/// Per-quote failures are reported inside the returned vector.
///
/// # Example
/// ```
/// use impliedvol_rs::prelude::*;
///
/// let batch = QuoteBatch::from_quotes(&[OptionQuote::call(100.0, 100.0, 0.25, 0.01, 5.0)]);
/// let results = solve_batch(&batch, &SolverConfig::default()).unwrap();
/// let solution = results[0].as_ref().unwrap();
/// assert!(solution.iv > 0.2 && solution.iv < 0.3);
/// ```
pub fn solve_batch(
    batch: &QuoteBatch,
    config: &SolverConfig,
) -> Result<Vec<SolverResult>, BatchError> {
    let solver = ImpliedVolSolver::new(config.clone())?;
    Ok(solver.solve_batch(batch))
}

/// Solves a single quote with `config`.
///
/// # Errors
/// Returns [`BatchError::InvalidConfig`] if the configuration is unusable.
pub fn solve_iv(quote: &OptionQuote, config: &SolverConfig) -> Result<SolverResult, BatchError> {
    let solver = ImpliedVolSolver::new(config.clone())?;
    Ok(solver.solve(quote))
}
