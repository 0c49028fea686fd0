use chrono::NaiveDate;
use serde::Serialize;

use crate::calculation::types::{OptionQuote, Root};
use crate::models::utils::{days_to_expiry, years_from_minutes};

/// One expiry's pooled quotes, strictly ascending by strike.
///
/// Root pooling has already happened: each strike appears once, taken from
/// whichever root won under the configured priority.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermLadder {
    pub quote_date: NaiveDate,
    pub expiry: NaiveDate,
    /// Root supplying most strikes; decides the settlement time
    pub settlement_root: Root,
    pub minutes_to_expiry: i64,
    quotes: Vec<OptionQuote>,
}

impl TermLadder {
    /// `quotes` must be unique per strike; they are put in ascending strike order here.
    pub fn new(
        quote_date: NaiveDate,
        expiry: NaiveDate,
        settlement_root: Root,
        minutes_to_expiry: i64,
        mut quotes: Vec<OptionQuote>,
    ) -> Self {
        quotes.sort_by(|a, b| a.strike.total_cmp(&b.strike));
        Self {
            quote_date,
            expiry,
            settlement_root,
            minutes_to_expiry,
            quotes,
        }
    }

    pub fn quotes(&self) -> &[OptionQuote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn strikes(&self) -> impl Iterator<Item = f64> + '_ {
        self.quotes.iter().map(|q| q.strike)
    }

    pub fn dte(&self) -> i64 {
        days_to_expiry(self.quote_date, self.expiry)
    }

    /// Time to expiration in years
    pub fn years(&self) -> f64 {
        years_from_minutes(self.minutes_to_expiry)
    }

    /// Index of the largest strike at or below `forward`.
    pub fn atm_index(&self, forward: f64) -> Option<usize> {
        let idx = self.quotes.partition_point(|q| q.strike <= forward);
        idx.checked_sub(1)
    }

    /// K0: the largest strike at or below `forward`.
    pub fn atm_strike(&self, forward: f64) -> Option<f64> {
        self.atm_index(forward).map(|i| self.quotes[i].strike)
    }
}
