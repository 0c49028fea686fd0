use chrono::NaiveDate;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::calculation::config::VixConfig;
use crate::calculation::types::{OptionChainSnapshot, OptionDiagnostics, TermResult, VixResult};
use crate::error::{CalcResult, TermKind, VixError};
use crate::models::chain::{ChainSelector, TermLadder};
use crate::models::index::{option_diagnostics, vix_from_terms};
use crate::models::rates::RateCurve;
use crate::models::term::TermCalculator;
use crate::models::traits::RateSource;

/// Runs selection, rate lookup and the two term calculations for one quote date,
/// then combines them into the 30-day index.
#[derive(Debug, Clone, Default)]
pub struct VixEngine {
    config: VixConfig,
    selector: ChainSelector,
    calculator: TermCalculator,
}

impl VixEngine {
    pub fn new(config: VixConfig) -> Self {
        Self {
            selector: ChainSelector::new(config.selection.clone()),
            calculator: TermCalculator::new(config.term.clone()),
            config,
        }
    }

    pub fn config(&self) -> &VixConfig {
        &self.config
    }

    /// Calculate the index for one snapshot.
    ///
    /// Fails closed: any error aborts the date and nothing partial is returned.
    /// Numeric guards that fired along the way are carried on the result.
    pub fn calculate<R>(&self, snapshot: &OptionChainSnapshot, rates: &R) -> CalcResult<VixResult>
    where
        R: RateSource + ?Sized,
    {
        snapshot.validate()?;
        let pair = self.selector.select(snapshot)?;
        let curve = rates.curve_for(snapshot.quote_date)?;

        let near = self.term(&pair.near, &curve, TermKind::Near)?;
        let next = self.term(&pair.next, &curve, TermKind::Next)?;

        let diagnostics =
            option_diagnostics(&pair.near, &pair.next, near.k0, &self.config.diagnostics);
        let result = Self::combine(&near, &next, diagnostics)?;

        if result.is_clean() {
            info!(
                quote_date = %result.quote_date,
                vix = result.calculated_vix,
                "index calculated"
            );
        } else {
            let tags: Vec<String> = result.guards.iter().map(|g| g.tag()).collect();
            warn!(
                quote_date = %result.quote_date,
                vix = result.calculated_vix,
                guards = %tags.join(";"),
                "index calculated with numeric guards"
            );
        }
        Ok(result)
    }

    /// Variance for one selected ladder, with the rate interpolated at its own
    /// time to expiration. Guards and errors come back labelled with `kind`.
    pub fn term(&self, ladder: &TermLadder, curve: &RateCurve, kind: TermKind) -> CalcResult<TermResult> {
        let rate = curve
            .interpolate(ladder.years())
            .map_err(|e| match e {
                VixError::MissingRateData { rate_date, .. } => VixError::MissingRateData {
                    quote_date: ladder.quote_date,
                    rate_date,
                },
                other => other,
            })?;

        let mut result = self
            .calculator
            .compute(ladder, rate.rate)
            .map_err(|e| e.for_term(kind))?;

        let mut guards: Vec<_> = rate.guard().into_iter().collect();
        guards.append(&mut result.guards);
        result.guards = guards.into_iter().map(|g| g.for_term(kind)).collect();
        Ok(result)
    }

    /// Combine two finished terms into a result record.
    ///
    /// Pure in its inputs: the same terms and diagnostics always give an
    /// identical record.
    pub fn combine(
        near: &TermResult,
        next: &TermResult,
        diagnostics: OptionDiagnostics,
    ) -> CalcResult<VixResult> {
        let calculated_vix = vix_from_terms(near, next)?;

        Ok(VixResult {
            quote_date: near.quote_date,
            calculated_vix,
            expiry1: near.expiry,
            expiry2: next.expiry,
            dte1: near.dte,
            dte2: next.dte,
            t1: near.t,
            t2: next.t,
            f1: near.forward,
            f2: next.forward,
            k0_1: near.k0,
            k0_2: next.k0,
            sigma1: near.sigma_squared,
            sigma2: next.sigma_squared,
            r1: near.r,
            r2: next.r,
            diagnostics,
            guards: near.guards.iter().chain(&next.guards).cloned().collect(),
        })
    }
}

/// A quote date that produced no result
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedDate {
    pub quote_date: NaiveDate,
    pub error: VixError,
}

/// Outcome of a multi-date run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One record per successful date, in input order
    pub results: Vec<VixResult>,
    pub skipped: Vec<SkippedDate>,
}

/// Calculated-vs-published statistics over the dates both sides cover.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub count: usize,
    pub mean_abs_diff: f64,
    pub max_abs_diff: f64,
    pub max_diff_date: NaiveDate,
    /// Share of dates within 0.01 index points, in percent
    pub pct_within_001: f64,
    /// Share of dates within 0.1 index points, in percent
    pub pct_within_01: f64,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.results.len() + self.skipped.len()
    }

    /// Compare against published closing values keyed by date. `None` when no
    /// date overlaps.
    pub fn compare_with(&self, market_vix: &BTreeMap<NaiveDate, f64>) -> Option<ComparisonSummary> {
        let pairs: Vec<(NaiveDate, &VixResult, f64)> = self
            .results
            .iter()
            .filter_map(|r| market_vix.get(&r.quote_date).map(|m| (r.quote_date, r, *m)))
            .collect();
        if pairs.is_empty() {
            return None;
        }

        let diffs: Vec<f64> = pairs
            .iter()
            .map(|(_, r, m)| (r.calculated_vix - m).abs())
            .collect();
        let (max_idx, max_abs_diff) = diffs
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, d)| if d > best.1 { (i, d) } else { best });

        let count = pairs.len();
        let share = |tol: f64| {
            let hits = pairs.iter().filter(|(_, r, m)| r.matches_market(*m, tol)).count();
            100.0 * hits as f64 / count as f64
        };

        Some(ComparisonSummary {
            count,
            mean_abs_diff: diffs.iter().mean(),
            max_abs_diff,
            max_diff_date: pairs[max_idx].0,
            pct_within_001: share(0.01),
            pct_within_01: share(0.1),
        })
    }
}

/// Calculate every snapshot independently. Failed dates are logged and
/// recorded as skipped; they never stop the batch.
pub fn run_batch<'a, R, I>(engine: &VixEngine, snapshots: I, rates: &R) -> BatchReport
where
    R: RateSource + ?Sized,
    I: IntoIterator<Item = &'a OptionChainSnapshot>,
{
    let mut report = BatchReport::default();

    for snapshot in snapshots {
        match engine.calculate(snapshot, rates) {
            Ok(result) => report.results.push(result),
            Err(error) => {
                warn!(quote_date = %snapshot.quote_date, %error, "skipping quote date");
                report.skipped.push(SkippedDate {
                    quote_date: snapshot.quote_date,
                    error,
                });
            }
        }
    }

    info!(
        total = report.total(),
        calculated = report.results.len(),
        skipped = report.skipped.len(),
        "batch finished"
    );
    report
}
