//! Black-Scholes pricing model and vega.
//!
//! Scalar formulas plus element-wise kernels that evaluate a whole
//! [`QuoteBatch`] column by column for the vectorized solver.

use super::batch::QuoteBatch;
use super::types::{OptionQuote, OptionType};
use std::f64::consts::PI;

/// Square root of 2, precomputed for efficiency.
const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Black-Scholes pricing model implementation.
///
/// Provides methods for calculating option prices and vega
/// using the Black-Scholes-Merton formula.
pub struct BlackScholes;

impl BlackScholes {
    /// Standard normal cumulative distribution function (CDF).
    ///
    /// Calculates P(Z ≤ x) through the complementary error function, which
    /// keeps full relative precision deep in the lower tail.
    #[must_use]
    pub fn norm_cdf(x: f64) -> f64 {
        0.5 * libm::erfc(-x / SQRT_2)
    }

    /// Standard normal probability density function (PDF).
    #[must_use]
    pub fn norm_pdf(x: f64) -> f64 {
        (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
    }

    /// Calculates the d1 parameter of the Black-Scholes formula.
    ///
    /// d1 = [ln(S/K) + (r + σ²/2)T] / (σ√T)
    ///
    /// # Arguments
    /// - `spot`: Current underlying price (S)
    /// - `strike`: Option strike price (K)
    /// - `rate`: Risk-free interest rate (r)
    /// - `time`: Time to expiration in years (T)
    /// - `vol`: Volatility (σ)
    #[must_use]
    pub fn d1(spot: f64, strike: f64, rate: f64, time: f64, vol: f64) -> f64 {
        let sqrt_time = time.sqrt();
        ((spot / strike).ln() + (rate + 0.5 * vol * vol) * time) / (vol * sqrt_time)
    }

    /// Calculates the d2 parameter of the Black-Scholes formula.
    ///
    /// d2 = d1 - σ√T
    #[must_use]
    pub fn d2(d1: f64, vol: f64, time: f64) -> f64 {
        d1 - vol * time.sqrt()
    }

    /// Theoretical price from raw inputs.
    ///
    /// For calls: C = S·N(d1) - K·e^(-rT)·N(d2)
    /// For puts:  P = K·e^(-rT)·N(-d2) - S·N(-d1)
    ///
    /// At expiry the option is worth its intrinsic value; with zero
    /// volatility it is worth the discounted forward intrinsic value.
    #[must_use]
    pub fn price_raw(
        spot: f64,
        strike: f64,
        time: f64,
        rate: f64,
        option_type: OptionType,
        vol: f64,
    ) -> f64 {
        if time <= 0.0 {
            return match option_type {
                OptionType::Call => (spot - strike).max(0.0),
                OptionType::Put => (strike - spot).max(0.0),
            };
        }

        let discount = (-rate * time).exp();

        if vol <= 0.0 {
            return match option_type {
                OptionType::Call => (spot - strike * discount).max(0.0),
                OptionType::Put => (strike * discount - spot).max(0.0),
            };
        }

        let d1 = Self::d1(spot, strike, rate, time, vol);
        let d2 = Self::d2(d1, vol, time);

        match option_type {
            OptionType::Call => spot * Self::norm_cdf(d1) - strike * discount * Self::norm_cdf(d2),
            OptionType::Put => strike * discount * Self::norm_cdf(-d2) - spot * Self::norm_cdf(-d1),
        }
    }

    /// Vega from raw inputs: S · N'(d1) · √T.
    ///
    /// Vega is the same for calls and puts and is never negative.
    #[must_use]
    pub fn vega_raw(spot: f64, strike: f64, time: f64, rate: f64, vol: f64) -> f64 {
        if time <= 0.0 || vol <= 0.0 {
            return 0.0;
        }

        let d1 = Self::d1(spot, strike, rate, time, vol);
        spot * Self::norm_pdf(d1) * time.sqrt()
    }

    /// Theoretical price of the quoted contract at volatility `vol`.
    ///
    /// The quote's observed price is ignored.
    #[must_use]
    pub fn price(quote: &OptionQuote, vol: f64) -> f64 {
        Self::price_raw(
            quote.spot,
            quote.strike,
            quote.time_to_expiry,
            quote.risk_free_rate,
            quote.option_type,
            vol,
        )
    }

    /// Vega (∂price/∂σ) of the quoted contract at volatility `vol`.
    #[must_use]
    pub fn vega(quote: &OptionQuote, vol: f64) -> f64 {
        Self::vega_raw(
            quote.spot,
            quote.strike,
            quote.time_to_expiry,
            quote.risk_free_rate,
            vol,
        )
    }

    /// Prices every quote of `batch` at the matching entry of `vols`.
    ///
    /// `vols` and `out` must have the batch length.
    pub fn price_batch_into(batch: &QuoteBatch, vols: &[f64], out: &mut [f64]) {
        debug_assert_eq!(vols.len(), batch.len());
        debug_assert_eq!(out.len(), batch.len());

        let columns = batch
            .spot()
            .iter()
            .zip(batch.strike())
            .zip(batch.time_to_expiry())
            .zip(batch.risk_free_rate())
            .zip(batch.option_type());

        for (((((s, k), t), r), ty), (vol, slot)) in columns.zip(vols.iter().zip(out.iter_mut())) {
            *slot = Self::price_raw(*s, *k, *t, *r, *ty, *vol);
        }
    }

    /// Evaluates price and vega for the lanes flagged in `active`.
    ///
    /// Inactive lanes are left untouched so frozen quotes cost nothing.
    pub fn price_and_vega_batch_into(
        batch: &QuoteBatch,
        vols: &[f64],
        active: &[bool],
        prices: &mut [f64],
        vegas: &mut [f64],
    ) {
        debug_assert_eq!(vols.len(), batch.len());
        debug_assert_eq!(active.len(), batch.len());
        debug_assert_eq!(prices.len(), batch.len());
        debug_assert_eq!(vegas.len(), batch.len());

        let columns = batch
            .spot()
            .iter()
            .zip(batch.strike())
            .zip(batch.time_to_expiry())
            .zip(batch.risk_free_rate())
            .zip(batch.option_type());
        let lanes = vols
            .iter()
            .zip(active)
            .zip(prices.iter_mut().zip(vegas.iter_mut()));

        for (((((s, k), t), r), ty), ((vol, on), (price, vega))) in columns.zip(lanes) {
            if !*on {
                continue;
            }
            *price = Self::price_raw(*s, *k, *t, *r, *ty, *vol);
            *vega = Self::vega_raw(*s, *k, *t, *r, *vol);
        }
    }
}
