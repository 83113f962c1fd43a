//! Concurrent cache for underlying prices keyed by ticker and timestamp.
//!
//! Entries expire `max_age` after insertion. A stale entry is never returned:
//! lookups evict it and report a miss.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    price: f64,
    inserted_at: Instant,
}

/// Thread-safe price cache with age-based staleness.
#[derive(Debug)]
pub struct PriceCache {
    entries: DashMap<(String, u64), CachedPrice>,
    max_age: Duration,
}

impl PriceCache {
    /// Creates an empty cache whose entries go stale after `max_age`.
    #[must_use]
    pub fn new(max_age: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_age,
        }
    }

    /// Maximum age of an entry before it is considered stale.
    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Stores `price` for `ticker` at `timestamp`, replacing any previous entry
    /// and restarting its age.
    pub fn insert(&self, ticker: &str, timestamp: u64, price: f64) {
        self.insert_at(ticker, timestamp, price, Instant::now());
    }

    fn insert_at(&self, ticker: &str, timestamp: u64, price: f64, inserted_at: Instant) {
        self.entries.insert(
            (ticker.to_string(), timestamp),
            CachedPrice { price, inserted_at },
        );
    }

    /// Returns the cached price if present and fresh.
    pub fn get(&self, ticker: &str, timestamp: u64) -> Option<f64> {
        self.get_at(ticker, timestamp, Instant::now())
    }

    fn get_at(&self, ticker: &str, timestamp: u64, now: Instant) -> Option<f64> {
        let key = (ticker.to_string(), timestamp);
        let entry = *self.entries.get(&key)?;

        if self.is_stale(&entry, now) {
            // re-check under the shard lock so a concurrent refresh survives
            self.entries
                .remove_if(&key, |_, cached| self.is_stale(cached, now));
            trace!("price cache: evicted stale {} @ {}", ticker, timestamp);
            return None;
        }

        Some(entry.price)
    }

    /// Returns the cached price, or computes, stores and returns a fresh one.
    pub fn get_or_insert_with<F>(&self, ticker: &str, timestamp: u64, fetch: F) -> f64
    where
        F: FnOnce() -> f64,
    {
        if let Some(price) = self.get(ticker, timestamp) {
            return price;
        }
        let price = fetch();
        self.insert(ticker, timestamp, price);
        price
    }

    /// Removes every stale entry and returns how many were dropped.
    pub fn purge_stale(&self) -> usize {
        self.purge_stale_at(Instant::now())
    }

    fn purge_stale_at(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, cached| {
            let stale = self.is_stale(cached, now);
            removed += usize::from(stale);
            !stale
        });
        if removed > 0 {
            trace!("price cache: purged {} stale entries", removed);
        }
        removed
    }

    /// Number of entries, fresh or stale.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    fn is_stale(&self, cached: &CachedPrice, now: Instant) -> bool {
        now.saturating_duration_since(cached.inserted_at) > self.max_age
    }
}
