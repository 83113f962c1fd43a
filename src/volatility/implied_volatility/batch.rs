//! Structure-of-arrays storage for option quotes.
//!
//! Each quote field lives in its own contiguous vector so the pricing kernels
//! can run element-wise over whole columns. All columns always have the same
//! length; the constructors enforce it.

use serde::{Deserialize, Serialize};

use super::error::BatchError;
use super::types::{OptionQuote, OptionType};

/// A batch of quotes in column layout.
///
/// Deserialization goes through [`QuoteBatch::from_columns`], so ragged
/// input is rejected instead of producing an inconsistent batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuoteBatchColumns")]
pub struct QuoteBatch {
    spot: Vec<f64>,
    strike: Vec<f64>,
    time_to_expiry: Vec<f64>,
    risk_free_rate: Vec<f64>,
    option_type: Vec<OptionType>,
    price: Vec<f64>,
}

/// Unchecked wire form of [`QuoteBatch`].
#[derive(Deserialize)]
struct QuoteBatchColumns {
    spot: Vec<f64>,
    strike: Vec<f64>,
    time_to_expiry: Vec<f64>,
    risk_free_rate: Vec<f64>,
    option_type: Vec<OptionType>,
    price: Vec<f64>,
}

impl TryFrom<QuoteBatchColumns> for QuoteBatch {
    type Error = BatchError;

    fn try_from(columns: QuoteBatchColumns) -> Result<Self, Self::Error> {
        Self::from_columns(
            columns.spot,
            columns.strike,
            columns.time_to_expiry,
            columns.risk_free_rate,
            columns.option_type,
            columns.price,
        )
    }
}

impl QuoteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty batch with room for `capacity` quotes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            spot: Vec::with_capacity(capacity),
            strike: Vec::with_capacity(capacity),
            time_to_expiry: Vec::with_capacity(capacity),
            risk_free_rate: Vec::with_capacity(capacity),
            option_type: Vec::with_capacity(capacity),
            price: Vec::with_capacity(capacity),
        }
    }

    /// Builds a batch from parallel columns.
    ///
    /// # Errors
    /// Returns [`BatchError::LengthMismatch`] naming the first column whose
    /// length differs from `spot`.
    pub fn from_columns(
        spot: Vec<f64>,
        strike: Vec<f64>,
        time_to_expiry: Vec<f64>,
        risk_free_rate: Vec<f64>,
        option_type: Vec<OptionType>,
        price: Vec<f64>,
    ) -> Result<Self, BatchError> {
        let expected = spot.len();
        let lengths = [
            ("strike", strike.len()),
            ("time_to_expiry", time_to_expiry.len()),
            ("risk_free_rate", risk_free_rate.len()),
            ("option_type", option_type.len()),
            ("price", price.len()),
        ];
        if let Some(&(field, actual)) = lengths.iter().find(|(_, len)| *len != expected) {
            return Err(BatchError::LengthMismatch {
                field,
                expected,
                actual,
            });
        }

        Ok(Self {
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            option_type,
            price,
        })
    }

    /// Builds a batch from row-oriented quotes, preserving order.
    #[must_use]
    pub fn from_quotes(quotes: &[OptionQuote]) -> Self {
        quotes.iter().copied().collect()
    }

    /// Appends a quote.
    pub fn push(&mut self, quote: OptionQuote) {
        self.spot.push(quote.spot);
        self.strike.push(quote.strike);
        self.time_to_expiry.push(quote.time_to_expiry);
        self.risk_free_rate.push(quote.risk_free_rate);
        self.option_type.push(quote.option_type);
        self.price.push(quote.price);
    }

    /// Number of quotes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spot.len()
    }

    /// Returns true if the batch holds no quotes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spot.is_empty()
    }

    /// Reassembles the quote at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<OptionQuote> {
        if index >= self.len() {
            return None;
        }
        Some(OptionQuote {
            spot: self.spot[index],
            strike: self.strike[index],
            time_to_expiry: self.time_to_expiry[index],
            risk_free_rate: self.risk_free_rate[index],
            option_type: self.option_type[index],
            price: self.price[index],
        })
    }

    /// Iterates over the quotes in order.
    pub fn iter(&self) -> impl Iterator<Item = OptionQuote> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// Spot column.
    #[must_use]
    pub fn spot(&self) -> &[f64] {
        &self.spot
    }

    /// Strike column.
    #[must_use]
    pub fn strike(&self) -> &[f64] {
        &self.strike
    }

    /// Time-to-expiry column, in years.
    #[must_use]
    pub fn time_to_expiry(&self) -> &[f64] {
        &self.time_to_expiry
    }

    /// Risk-free rate column.
    #[must_use]
    pub fn risk_free_rate(&self) -> &[f64] {
        &self.risk_free_rate
    }

    /// Option type column.
    #[must_use]
    pub fn option_type(&self) -> &[OptionType] {
        &self.option_type
    }

    /// Observed price column.
    #[must_use]
    pub fn price(&self) -> &[f64] {
        &self.price
    }
}

impl FromIterator<OptionQuote> for QuoteBatch {
    fn from_iter<I: IntoIterator<Item = OptionQuote>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut batch = Self::with_capacity(iter.size_hint().0);
        for quote in iter {
            batch.push(quote);
        }
        batch
    }
}

impl Extend<OptionQuote> for QuoteBatch {
    fn extend<I: IntoIterator<Item = OptionQuote>>(&mut self, iter: I) {
        for quote in iter {
            self.push(quote);
        }
    }
}
