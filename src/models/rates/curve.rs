use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::error::{CalcResult, NumericGuard, VixError};

/// Days per year used to map a year fraction onto tenor days
const DAYS_PER_YEAR: f64 = 365.0;

/// CMT tenor labels published in the daily par-yield table, in calendar days.
pub const CMT_TENORS: &[(&str, u32)] = &[
    ("1mo", 30),
    ("1.5mo", 45),
    ("2mo", 60),
    ("3mo", 91),
    ("4mo", 122),
    ("6mo", 182),
    ("1yr", 364),
    ("2yr", 730),
    ("3yr", 1095),
    ("5yr", 1825),
    ("7yr", 2555),
    ("10yr", 3650),
    ("20yr", 7300),
    ("30yr", 10950),
];

/// Map a tenor label ("1mo", "1 Mo", "10yr", ...) to calendar days.
pub fn tenor_days(label: &str) -> Option<u32> {
    let key: String = label
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    CMT_TENORS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, days)| *days)
}

/// Continuously compounded equivalent of a semi-annual bond-equivalent yield.
pub fn bey_to_continuous(par_yield: f64) -> f64 {
    2.0 * (par_yield / 2.0).ln_1p()
}

/// One tenor point of a curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TenorPoint {
    pub days: u32,
    /// Par yield as decimal (0.045 for 4.5%)
    pub par_yield: f64,
}

/// Output of an interpolation at one maturity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InterpolatedRate {
    pub years: f64,
    pub par_yield: f64,
    /// Continuously compounded rate
    pub rate: f64,
    /// Tenor used when the maturity fell outside the curve
    pub clamped_to: Option<u32>,
}

impl InterpolatedRate {
    pub fn guard(&self) -> Option<NumericGuard> {
        self.clamped_to.map(|tenor_days| NumericGuard::RateClamped {
            term: None,
            years: self.years,
            tenor_days,
        })
    }
}

/// Par-yield curve for one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCurve {
    pub date: NaiveDate,
    points: Vec<TenorPoint>,
}

impl RateCurve {
    /// Build a curve from `(days, yield)` pairs. Non-finite yields are dropped and
    /// duplicate tenors keep the last value.
    pub fn new(date: NaiveDate, points: impl IntoIterator<Item = (u32, f64)>) -> Self {
        let mut points: Vec<TenorPoint> = points
            .into_iter()
            .filter(|(_, y)| y.is_finite())
            .map(|(days, par_yield)| TenorPoint { days, par_yield })
            .collect();
        points.sort_by_key(|p| p.days);
        // keep the last occurrence of each tenor
        points.reverse();
        points.dedup_by_key(|p| p.days);
        points.reverse();
        Self { date, points }
    }

    /// Build a curve from labelled tenors. Unknown labels are an error.
    pub fn from_labels<'a>(
        date: NaiveDate,
        points: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Result<Self, String> {
        let mut resolved = Vec::new();
        for (label, value) in points {
            let days = tenor_days(label).ok_or_else(|| format!("unknown tenor label: {}", label))?;
            resolved.push((days, value));
        }
        Ok(Self::new(date, resolved))
    }

    pub fn points(&self) -> &[TenorPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn shortest_tenor(&self) -> Option<u32> {
        self.points.first().map(|p| p.days)
    }

    pub fn longest_tenor(&self) -> Option<u32> {
        self.points.last().map(|p| p.days)
    }

    pub fn par_yield_at(&self, days: u32) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.days == days)
            .map(|p| p.par_yield)
    }

    /// Interpolate the par yield at `years`, then convert to continuous compounding.
    ///
    /// Maturities outside the tenor range are clamped to the nearest tenor and the
    /// result is flagged through `clamped_to`.
    pub fn interpolate(&self, years: f64) -> CalcResult<InterpolatedRate> {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => {
                return Err(VixError::MissingRateData {
                    quote_date: self.date,
                    rate_date: self.date,
                })
            }
        };

        let days = years * DAYS_PER_YEAR;

        let (par_yield, clamped_to) = if days < first.days as f64 {
            (first.par_yield, Some(first.days))
        } else if days > last.days as f64 {
            (last.par_yield, Some(last.days))
        } else {
            (self.linear_yield(days), None)
        };

        let rate = bey_to_continuous(par_yield);

        match clamped_to {
            Some(tenor) => debug!(
                date = %self.date,
                years,
                tenor,
                rate,
                "maturity outside curve, clamped to nearest tenor"
            ),
            None => debug!(date = %self.date, years, par_yield, rate, "interpolated rate"),
        }

        Ok(InterpolatedRate {
            years,
            par_yield,
            rate,
            clamped_to,
        })
    }

    /// Continuously compounded rate for a maturity in years.
    pub fn rate(&self, years: f64) -> CalcResult<f64> {
        self.interpolate(years).map(|r| r.rate)
    }

    // Caller guarantees `days` lies within [first, last].
    fn linear_yield(&self, days: f64) -> f64 {
        let idx = self
            .points
            .partition_point(|p| (p.days as f64).partial_cmp(&days) == Some(Ordering::Less));

        if idx < self.points.len() && self.points[idx].days as f64 == days {
            return self.points[idx].par_yield;
        }
        if idx == 0 {
            return self.points[0].par_yield;
        }

        let lo = self.points[idx - 1];
        let hi = self.points[idx.min(self.points.len() - 1)];
        if hi.days == lo.days {
            return lo.par_yield;
        }
        let w = (days - lo.days as f64) / (hi.days as f64 - lo.days as f64);
        lo.par_yield + (hi.par_yield - lo.par_yield) * w
    }

    /// Tenor-by-tenor linear blend between two curves for a date lying between them.
    /// Only tenors present on both curves survive.
    pub fn blend(before: &RateCurve, after: &RateCurve, date: NaiveDate) -> RateCurve {
        let span = (after.date - before.date).num_days() as f64;
        let w_after = if span > 0.0 {
            (date - before.date).num_days() as f64 / span
        } else {
            0.0
        };
        let w_before = 1.0 - w_after;

        let points = before.points.iter().filter_map(|b| {
            after
                .par_yield_at(b.days)
                .map(|a| (b.days, b.par_yield * w_before + a * w_after))
        });
        RateCurve::new(date, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> RateCurve {
        RateCurve::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            vec![(30, 0.0530), (60, 0.0535), (91, 0.0540), (182, 0.0520)],
        )
    }

    #[test]
    fn test_tenor_labels() {
        assert_eq!(tenor_days("1mo"), Some(30));
        assert_eq!(tenor_days("1 Mo"), Some(30));
        assert_eq!(tenor_days("10 Yr"), Some(3650));
        assert_eq!(tenor_days("weekly"), None);
    }

    #[test]
    fn test_exact_tenor_is_not_clamped() {
        let c = curve();
        let r = c.interpolate(60.0 / 365.0).unwrap();
        assert!((r.par_yield - 0.0535).abs() < 1e-12);
        assert!(r.clamped_to.is_none());
    }

    #[test]
    fn test_midpoint_interpolation() {
        let c = curve();
        let r = c.interpolate(45.0 / 365.0).unwrap();
        assert!((r.par_yield - 0.05325).abs() < 1e-12);
        assert!((r.rate - 2.0 * (1.0 + 0.05325 / 2.0_f64).ln()).abs() < 1e-14);
    }

    #[test]
    fn test_duplicate_tenor_keeps_last() {
        let c = RateCurve::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            vec![(30, 0.01), (30, 0.02), (60, f64::NAN)],
        );
        assert_eq!(c.len(), 1);
        assert_eq!(c.par_yield_at(30), Some(0.02));
    }
}
