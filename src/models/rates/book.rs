use chrono::NaiveDate;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::debug;

use super::curve::RateCurve;
use crate::error::{CalcResult, VixError};
use crate::models::traits::RateSource;

/// Treasury curves keyed by publication date.
///
/// Dates without a published curve (holidays, bond-market closures) borrow a
/// tenor-by-tenor blend of the nearest earlier and later curves, as long as both
/// lie within `max_gap_days`.
#[derive(Debug, Clone, Default)]
pub struct RateBook {
    curves: BTreeMap<NaiveDate, RateCurve>,
    max_gap_days: i64,
}

impl RateBook {
    pub fn new(max_gap_days: i64) -> Self {
        Self {
            curves: BTreeMap::new(),
            max_gap_days,
        }
    }

    pub fn insert(&mut self, curve: RateCurve) {
        self.curves.insert(curve.date, curve);
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&RateCurve> {
        self.curves.get(&date)
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.curves.keys()
    }
}

impl FromIterator<RateCurve> for RateBook {
    fn from_iter<I: IntoIterator<Item = RateCurve>>(iter: I) -> Self {
        let mut book = RateBook::new(crate::calculation::config::RateConfig::default().max_gap_days);
        for curve in iter {
            book.insert(curve);
        }
        book
    }
}

impl RateSource for RateBook {
    fn curve_for(&self, date: NaiveDate) -> CalcResult<Cow<'_, RateCurve>> {
        let missing = || VixError::MissingRateData {
            quote_date: date,
            rate_date: date,
        };

        // An exact curve with no yields is treated as an unpublished date.
        if let Some(curve) = self.curves.get(&date).filter(|c| !c.is_empty()) {
            return Ok(Cow::Borrowed(curve));
        }

        let before = self
            .curves
            .range(..date)
            .rev()
            .find(|(_, c)| !c.is_empty())
            .map(|(_, c)| c);
        let after = self
            .curves
            .range(date..)
            .find(|(_, c)| !c.is_empty())
            .map(|(_, c)| c);

        match (before, after) {
            (Some(b), Some(a))
                if (date - b.date).num_days() <= self.max_gap_days
                    && (a.date - date).num_days() <= self.max_gap_days =>
            {
                debug!(%date, before = %b.date, after = %a.date, "blending neighbouring curves");
                let blended = RateCurve::blend(b, a, date);
                if blended.is_empty() {
                    Err(missing())
                } else {
                    Ok(Cow::Owned(blended))
                }
            }
            _ => Err(missing()),
        }
    }
}

/// A single curve serves every date it is asked for.
impl RateSource for RateCurve {
    fn curve_for(&self, date: NaiveDate) -> CalcResult<Cow<'_, RateCurve>> {
        if self.is_empty() {
            return Err(VixError::MissingRateData {
                quote_date: date,
                rate_date: self.date,
            });
        }
        Ok(Cow::Borrowed(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    #[test]
    fn test_blend_between_neighbours() {
        let mut book = RateBook::new(5);
        book.insert(RateCurve::new(d(3), vec![(30, 0.050), (60, 0.052)]));
        book.insert(RateCurve::new(d(5), vec![(30, 0.054), (91, 0.056)]));

        // July 4th sits halfway; only the 30-day tenor exists on both sides
        let curve = book.curve_for(d(4)).unwrap();
        assert_eq!(curve.date, d(4));
        assert_eq!(curve.len(), 1);
        assert!((curve.par_yield_at(30).unwrap() - 0.052).abs() < 1e-12);
    }

    #[test]
    fn test_gap_too_wide_is_missing() {
        let mut book = RateBook::new(2);
        book.insert(RateCurve::new(d(1), vec![(30, 0.05)]));
        book.insert(RateCurve::new(d(10), vec![(30, 0.05)]));
        assert!(matches!(
            book.curve_for(d(5)),
            Err(VixError::MissingRateData { .. })
        ));
    }

    #[test]
    fn test_empty_exact_curve_is_missing() {
        let mut book = RateBook::new(5);
        book.insert(RateCurve::new(d(3), Vec::new()));
        assert!(matches!(
            book.curve_for(d(3)),
            Err(VixError::MissingRateData { .. })
        ));
    }

    #[test]
    fn test_empty_exact_curve_blends_like_an_absent_one() {
        let mut with_blank = RateBook::new(5);
        with_blank.insert(RateCurve::new(d(1), vec![(30, 0.050), (60, 0.052)]));
        with_blank.insert(RateCurve::new(d(4), Vec::new()));
        with_blank.insert(RateCurve::new(d(5), vec![(30, 0.054), (60, 0.056)]));

        let without: RateBook = [d(1), d(5)]
            .into_iter()
            .filter_map(|day| with_blank.get(day).cloned())
            .collect();
        assert_eq!(without.dates().copied().collect::<Vec<_>>(), vec![d(1), d(5)]);

        let blended = with_blank.curve_for(d(4)).unwrap();
        assert_eq!(blended.date, d(4));
        assert!((blended.par_yield_at(30).unwrap() - 0.053).abs() < 1e-12);
        assert_eq!(*blended, *without.curve_for(d(4)).unwrap());
    }
}
