//! Historical (realized) volatility and its comparison against an implied
//! volatility series.
//!
//! Historical volatility is the annualized rolling sample standard deviation
//! of daily log returns. Comparing it with an implied series (a volatility
//! index, or IVs solved from option quotes) gives the IV−HV spread.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Errors from historical volatility computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoricalVolError {
    /// Rolling window too short for a sample standard deviation.
    WindowTooSmall {
        /// Requested window in returns.
        window: usize,
    },

    /// Two series meant to be aligned have different lengths.
    LengthMismatch {
        /// Length of the implied series.
        implied: usize,
        /// Length of the historical series.
        historical: usize,
    },
}

impl fmt::Display for HistoricalVolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoricalVolError::WindowTooSmall { window } => {
                write!(f, "rolling window must cover at least 2 returns, got {window}")
            }
            HistoricalVolError::LengthMismatch {
                implied,
                historical,
            } => {
                write!(
                    f,
                    "series are not aligned: {implied} implied vs {historical} historical values"
                )
            }
        }
    }
}

impl std::error::Error for HistoricalVolError {}

/// Annualized rolling historical volatility of `closes`.
///
/// HV = stdev(log returns over `window` returns) × √252
///
/// Values are annualized fractions (0.20 for 20%), the unit the solver
/// reports. Volatility indices such as VIX are quoted in percent; use
/// [`historical_volatility_percent`] to compare against them.
///
/// The output has one entry per close. An entry is `None` until a full
/// window of returns is available, and whenever the window contains a
/// return that cannot be computed (non-positive or non-finite close).
///
/// # Errors
/// Returns [`HistoricalVolError::WindowTooSmall`] if `window < 2`.
pub fn historical_volatility(
    closes: &[f64],
    window: usize,
) -> Result<Vec<Option<f64>>, HistoricalVolError> {
    if window < 2 {
        return Err(HistoricalVolError::WindowTooSmall { window });
    }

    let returns: Vec<Option<f64>> = closes
        .windows(2)
        .map(|pair| {
            let (previous, current) = (pair[0], pair[1]);
            if previous > 0.0 && current > 0.0 && previous.is_finite() && current.is_finite() {
                Some((current / previous).ln())
            } else {
                None
            }
        })
        .collect();

    let mut out = vec![None; closes.len()];
    // out[i] covers returns ending at close i, i.e. returns[i - window..i]
    for (i, slot) in out.iter_mut().enumerate().skip(window) {
        let sample: Option<Vec<f64>> = returns[i - window..i].iter().copied().collect();
        *slot = sample.map(|values| sample_std(&values) * TRADING_DAYS_PER_YEAR.sqrt());
    }

    trace!(
        "historical volatility over {} closes with window {}: {} values",
        closes.len(),
        window,
        out.iter().flatten().count()
    );
    Ok(out)
}

/// [`historical_volatility`] scaled to percent points.
///
/// # Errors
/// Returns [`HistoricalVolError::WindowTooSmall`] if `window < 2`.
pub fn historical_volatility_percent(
    closes: &[f64],
    window: usize,
) -> Result<Vec<Option<f64>>, HistoricalVolError> {
    Ok(historical_volatility(closes, window)?
        .into_iter()
        .map(|hv| hv.map(|value| value * 100.0))
        .collect())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Summary of an implied series against a historical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolComparison {
    /// Number of positions where both series have a value.
    pub observations: usize,
    /// Mean implied volatility over those positions.
    pub iv_mean: f64,
    /// Mean historical volatility over those positions.
    pub hv_mean: f64,
    /// Mean of IV − HV.
    pub mean_spread: f64,
    /// Pearson correlation, `None` when either series is constant.
    pub correlation: Option<f64>,
}

impl VolComparison {
    /// Compares two position-aligned series, skipping positions where
    /// either side is missing or non-finite.
    ///
    /// # Errors
    /// Returns [`HistoricalVolError::LengthMismatch`] if the lengths differ.
    ///
    /// # Returns
    /// `Ok(None)` when no position has both values.
    pub fn compute(
        implied: &[Option<f64>],
        historical: &[Option<f64>],
    ) -> Result<Option<Self>, HistoricalVolError> {
        if implied.len() != historical.len() {
            return Err(HistoricalVolError::LengthMismatch {
                implied: implied.len(),
                historical: historical.len(),
            });
        }

        let (iv, hv): (Vec<f64>, Vec<f64>) = implied
            .iter()
            .zip(historical)
            .filter_map(|pair| match pair {
                (Some(iv), Some(hv)) if iv.is_finite() && hv.is_finite() => Some((*iv, *hv)),
                _ => None,
            })
            .unzip();

        if iv.is_empty() {
            return Ok(None);
        }

        let iv_mean = mean(&iv);
        let hv_mean = mean(&hv);

        let mut covariance = 0.0;
        let mut iv_var = 0.0;
        let mut hv_var = 0.0;
        for (a, b) in iv.iter().zip(&hv) {
            covariance += (a - iv_mean) * (b - hv_mean);
            iv_var += (a - iv_mean).powi(2);
            hv_var += (b - hv_mean).powi(2);
        }
        let correlation = if iv_var > 0.0 && hv_var > 0.0 {
            Some(covariance / (iv_var.sqrt() * hv_var.sqrt()))
        } else {
            None
        };

        Ok(Some(Self {
            observations: iv.len(),
            iv_mean,
            hv_mean,
            mean_spread: iv_mean - hv_mean,
            correlation,
        }))
    }
}
