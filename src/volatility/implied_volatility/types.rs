//! Types for implied volatility calculation.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::error::{FailureCode, IVError};

/// Option type for IV calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Call option (right to buy the underlying at strike price).
    Call,
    /// Put option (right to sell the underlying at strike price).
    Put,
}

/// How a price sitting exactly on the upper no-arbitrage bound is treated.
///
/// The lower bound is always inclusive: a price equal to it is solved to the
/// minimum volatility and flagged [`SolvePath::FLOORED`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundConvention {
    /// A price equal to the upper bound is rejected as out of bounds.
    #[default]
    Strict,
    /// A price equal to the upper bound maps to the maximum volatility.
    Inclusive,
}

/// One observed option price with the remaining Black-Scholes inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    /// Underlying spot price in price units.
    pub spot: f64,
    /// Option strike price in price units.
    pub strike: f64,
    /// Time to expiration in years (e.g., 30 days = 30.0 / 365.0).
    pub time_to_expiry: f64,
    /// Risk-free interest rate (annualized, e.g., 0.05 for 5%).
    pub risk_free_rate: f64,
    /// Option type (Call or Put).
    pub option_type: OptionType,
    /// Observed market price of the option.
    pub price: f64,
}

impl OptionQuote {
    /// Creates a new quote.
    ///
    /// # Arguments
    /// - `spot`: Underlying spot price in price units
    /// - `strike`: Option strike price in price units
    /// - `time_to_expiry`: Time to expiration in years
    /// - `risk_free_rate`: Risk-free interest rate (annualized)
    /// - `option_type`: Call or Put
    /// - `price`: Observed market price
    #[must_use]
    pub fn new(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        option_type: OptionType,
        price: f64,
    ) -> Self {
        Self {
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            option_type,
            price,
        }
    }

    /// Creates a call quote.
    #[must_use]
    pub fn call(spot: f64, strike: f64, time_to_expiry: f64, risk_free_rate: f64, price: f64) -> Self {
        Self::new(
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            OptionType::Call,
            price,
        )
    }

    /// Creates a put quote.
    #[must_use]
    pub fn put(spot: f64, strike: f64, time_to_expiry: f64, risk_free_rate: f64, price: f64) -> Self {
        Self::new(
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            OptionType::Put,
            price,
        )
    }

    /// Returns the same contract with a different observed price.
    #[must_use]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// Discount factor `e^(-rT)`.
    #[must_use]
    pub fn discount_factor(&self) -> f64 {
        (-self.risk_free_rate * self.time_to_expiry).exp()
    }

    /// Calculates the intrinsic value of the option.
    ///
    /// For calls: max(0, spot - strike)
    /// For puts: max(0, strike - spot)
    #[must_use]
    pub fn intrinsic_value(&self) -> f64 {
        match self.option_type {
            OptionType::Call => (self.spot - self.strike).max(0.0),
            OptionType::Put => (self.strike - self.spot).max(0.0),
        }
    }

    /// No-arbitrage price range for this contract.
    #[must_use]
    pub fn bounds(&self) -> NoArbitrageBounds {
        NoArbitrageBounds::compute(
            self.spot,
            self.strike,
            self.time_to_expiry,
            self.risk_free_rate,
            self.option_type,
        )
    }
}

/// Volatility-independent price range of a European option.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoArbitrageBounds {
    /// Lowest arbitrage-free price.
    pub lower: f64,
    /// Highest arbitrage-free price.
    pub upper: f64,
}

impl NoArbitrageBounds {
    /// Computes the bounds.
    ///
    /// For calls: max(0, S - K·e^(-rT)) ≤ P ≤ S
    /// For puts:  max(0, K·e^(-rT) - S) ≤ P ≤ K·e^(-rT)
    ///
    /// At expiry both bounds collapse onto the intrinsic value.
    #[must_use]
    pub fn compute(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        option_type: OptionType,
    ) -> Self {
        if time_to_expiry == 0.0 {
            let intrinsic = match option_type {
                OptionType::Call => (spot - strike).max(0.0),
                OptionType::Put => (strike - spot).max(0.0),
            };
            return Self {
                lower: intrinsic,
                upper: intrinsic,
            };
        }

        let discounted_strike = strike * (-risk_free_rate * time_to_expiry).exp();
        match option_type {
            OptionType::Call => Self {
                lower: (spot - discounted_strike).max(0.0),
                upper: spot,
            },
            OptionType::Put => Self {
                lower: (discounted_strike - spot).max(0.0),
                upper: discounted_strike,
            },
        }
    }

    /// Returns true if `price` is admissible under `convention`.
    #[must_use]
    pub fn admits(&self, price: f64, convention: BoundConvention) -> bool {
        if price < self.lower {
            return false;
        }
        match convention {
            // lower bound stays inclusive even when both bounds coincide
            BoundConvention::Strict => price < self.upper || price == self.lower,
            BoundConvention::Inclusive => price <= self.upper,
        }
    }
}

bitflags! {
    /// Which numerical paths produced a solution.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct SolvePath: u8 {
        /// At least one Newton-Raphson step was taken.
        const NEWTON = 1;
        /// Vega fell below the floor and the quote was finished by bisection.
        const BISECTION = 1 << 1;
        /// A Newton iterate left the bracket and was replaced by its midpoint.
        const SAFEGUARDED = 1 << 2;
        /// Price at or below the minimum-volatility price; IV pinned to `min_vol`.
        const FLOORED = 1 << 3;
        /// Price at or above the maximum-volatility price; IV pinned to `max_vol`.
        const CAPPED = 1 << 4;
        /// Quote had zero time to expiry.
        const EXPIRED = 1 << 5;
    }
}

impl SolvePath {
    /// Returns true if the result came from a degenerate path rather than a
    /// converged root (pinned to a volatility bound or expired).
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.intersects(SolvePath::FLOORED | SolvePath::CAPPED | SolvePath::EXPIRED)
    }
}

/// Successful outcome for one quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IVSolution {
    /// Implied volatility (0.0 - 1.0+, e.g., 0.25 = 25%).
    pub iv: f64,
    /// Number of solver iterations spent on this quote.
    pub iterations: u32,
    /// Price residual `BS(iv) - price`.
    pub residual: f64,
    /// Numerical paths taken.
    pub path: SolvePath,
}

impl IVSolution {
    /// Returns the IV as a percentage (e.g., 25.0 for 25%).
    #[must_use]
    pub fn iv_percent(&self) -> f64 {
        self.iv * 100.0
    }

    /// Narrows the solution to single precision for storage.
    #[must_use]
    pub fn narrow(&self) -> CompactIVSolution {
        CompactIVSolution {
            iv: self.iv as f32,
            residual: self.residual as f32,
            iterations: self.iterations,
            path: self.path,
        }
    }
}

/// Single-precision copy of an [`IVSolution`], built only after solving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompactIVSolution {
    /// Implied volatility.
    pub iv: f32,
    /// Price residual at the solution.
    pub residual: f32,
    /// Number of solver iterations.
    pub iterations: u32,
    /// Numerical paths taken.
    pub path: SolvePath,
}

/// Per-quote solver output.
pub type SolverResult = Result<IVSolution, IVError>;

/// Narrows finished results for compact storage, keeping only the reason
/// code of failures. Order is preserved.
#[must_use]
pub fn narrow_results(results: &[SolverResult]) -> Vec<Result<CompactIVSolution, FailureCode>> {
    results
        .iter()
        .map(|result| match result {
            Ok(solution) => Ok(solution.narrow()),
            Err(error) => Err(error.code()),
        })
        .collect()
}
