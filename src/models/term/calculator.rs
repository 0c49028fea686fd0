use tracing::{debug, warn};

use crate::calculation::config::TermConfig;
use crate::calculation::types::{ContributionKind, OptionQuote, StrikeContribution, TermResult};
use crate::error::{CalcResult, LadderSide, NumericGuard, VixError};
use crate::models::chain::TermLadder;

/// Strike whose call/put mids are closest, and the forward implied there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardQuote {
    pub strike: f64,
    pub call_mid: f64,
    pub put_mid: f64,
    pub forward: f64,
}

/// Forward index level via put-call parity at the strike with the smallest
/// absolute call/put mid difference: `F = K + e^(RT)·(C − P)`.
///
/// Only strikes with both mids available are considered; ties keep the lower strike.
pub fn forward_price(ladder: &TermLadder, r: f64, t: f64) -> Option<ForwardQuote> {
    let growth = (r * t).exp();
    let mut best: Option<(f64, &OptionQuote, f64, f64)> = None;

    for quote in ladder.quotes() {
        let (Some(c), Some(p)) = (quote.call_mid(), quote.put_mid()) else {
            continue;
        };
        let diff = (c - p).abs();
        if best.map_or(true, |(d, ..)| diff < d) {
            best = Some((diff, quote, c, p));
        }
    }

    best.map(|(_, quote, c, p)| ForwardQuote {
        strike: quote.strike,
        call_mid: c,
        put_mid: p,
        forward: quote.strike + growth * (c - p),
    })
}

/// Walk outward from K0 along one wing, keeping strikes whose OTM leg has a
/// non-zero bid and ask. The walk ends at the first run of `truncation`
/// consecutive zero bids; nothing beyond it is used even if quotes reappear.
///
/// Returns ladder indices in walk order (nearest K0 first).
pub fn walk_wing(
    quotes: &[OptionQuote],
    indices: impl Iterator<Item = usize>,
    side: LadderSide,
    truncation: usize,
) -> Vec<usize> {
    let mut kept = Vec::new();
    let mut zero_run = 0usize;

    for i in indices {
        let q = &quotes[i];
        let (bid, ask) = match side {
            LadderSide::Puts => (q.put_bid, q.put_ask),
            LadderSide::Calls => (q.call_bid, q.call_ask),
        };

        if bid <= 0.0 {
            zero_run += 1;
            if truncation > 0 && zero_run >= truncation {
                debug!(strike = q.strike, %side, "two consecutive zero bids, wing truncated");
                break;
            }
            continue;
        }
        zero_run = 0;
        if ask > 0.0 {
            kept.push(i);
        }
    }

    kept
}

/// `ΔK` for each strike of an ascending ladder: half the distance between the
/// neighbouring strikes, single-sided at either end.
pub fn strike_intervals(strikes: &[f64]) -> Vec<f64> {
    let n = strikes.len();
    (0..n)
        .map(|i| match (i.checked_sub(1), (i + 1 < n).then_some(i + 1)) {
            (Some(lo), Some(hi)) => (strikes[hi] - strikes[lo]) / 2.0,
            (None, Some(hi)) => strikes[hi] - strikes[i],
            (Some(lo), None) => strikes[i] - strikes[lo],
            (None, None) => 0.0,
        })
        .collect()
}

/// Computes forward, K0 and generalized variance for a single expiry.
#[derive(Debug, Clone, Default)]
pub struct TermCalculator {
    config: TermConfig,
}

impl TermCalculator {
    pub fn new(config: TermConfig) -> Self {
        Self { config }
    }

    /// Generalized variance for one ladder at continuously compounded rate `r`:
    ///
    /// ```text
    /// σ² = (2/T) Σ ΔKᵢ/Kᵢ² · e^(RT) · Q(Kᵢ) − (1/T) (F/K0 − 1)²
    /// ```
    ///
    /// Deterministic: the sum always runs in ascending strike order.
    pub fn compute(&self, ladder: &TermLadder, r: f64) -> CalcResult<TermResult> {
        let quote_date = ladder.quote_date;
        let t = ladder.years();
        if t <= 0.0 || !t.is_finite() {
            return Err(VixError::invalid_input(
                quote_date,
                format!("expiry {} has no time left to expiration", ladder.expiry),
            ));
        }

        let fwd = forward_price(ladder, r, t).ok_or_else(|| {
            VixError::invalid_input(
                quote_date,
                format!(
                    "expiry {} has no strike with both call and put bids",
                    ladder.expiry
                ),
            )
        })?;
        let forward = fwd.forward;

        let k0_idx = ladder.atm_index(forward).ok_or_else(|| {
            VixError::invalid_input(
                quote_date,
                format!(
                    "forward {:.4} for {} lies below the lowest strike",
                    forward, ladder.expiry
                ),
            )
        })?;

        let quotes = ladder.quotes();
        let k0_quote = &quotes[k0_idx];
        let k0 = k0_quote.strike;

        let puts = walk_wing(
            quotes,
            (0..k0_idx).rev(),
            LadderSide::Puts,
            self.config.zero_bid_truncation,
        );
        let calls = walk_wing(
            quotes,
            k0_idx + 1..quotes.len(),
            LadderSide::Calls,
            self.config.zero_bid_truncation,
        );

        for (side, found) in [(LadderSide::Puts, puts.len()), (LadderSide::Calls, calls.len())] {
            if found < self.config.min_strikes_per_side {
                return Err(VixError::InsufficientStrikes {
                    quote_date,
                    expiry: ladder.expiry,
                    term: None,
                    side,
                    found,
                    required: self.config.min_strikes_per_side,
                });
            }
        }

        let k0_mid = match (k0_quote.call_mid(), k0_quote.put_mid()) {
            (Some(c), Some(p)) => (c + p) / 2.0,
            (Some(m), None) | (None, Some(m)) => m,
            (None, None) => {
                return Err(VixError::invalid_input(
                    quote_date,
                    format!("no bid on either leg at K0 {} for {}", k0, ladder.expiry),
                ))
            }
        };

        // Ascending: puts (reversed walk), K0, calls.
        let mut selected: Vec<(f64, ContributionKind, f64)> =
            Vec::with_capacity(puts.len() + calls.len() + 1);
        for &i in puts.iter().rev() {
            let q = &quotes[i];
            selected.push((q.strike, ContributionKind::Put, (q.put_bid + q.put_ask) / 2.0));
        }
        selected.push((k0, ContributionKind::PutCallAverage, k0_mid));
        for &i in &calls {
            let q = &quotes[i];
            selected.push((q.strike, ContributionKind::Call, (q.call_bid + q.call_ask) / 2.0));
        }

        let strikes: Vec<f64> = selected.iter().map(|(k, ..)| *k).collect();
        let intervals = strike_intervals(&strikes);
        let growth = (r * t).exp();

        let contributions: Vec<StrikeContribution> = selected
            .into_iter()
            .zip(intervals)
            .map(|((strike, kind, mid), delta_k)| StrikeContribution {
                strike,
                kind,
                mid,
                delta_k,
                contribution: delta_k / (strike * strike) * growth * mid,
            })
            .collect();

        let weighted_sum: f64 = contributions.iter().map(|c| c.contribution).sum();
        let raw = 2.0 / t * weighted_sum - (forward / k0 - 1.0).powi(2) / t;

        let mut guards = Vec::new();
        let sigma_squared = if raw < 0.0 {
            warn!(
                %quote_date,
                expiry = %ladder.expiry,
                raw,
                "negative generalized variance clamped to zero"
            );
            guards.push(NumericGuard::VarianceClamped { term: None, raw });
            0.0
        } else {
            raw
        };

        debug!(
            %quote_date,
            expiry = %ladder.expiry,
            forward,
            k0,
            puts = puts.len(),
            calls = calls.len(),
            sigma_squared,
            "term variance"
        );

        Ok(TermResult {
            quote_date,
            expiry: ladder.expiry,
            settlement_root: ladder.settlement_root,
            dte: ladder.dte(),
            minutes_to_expiry: ladder.minutes_to_expiry,
            t,
            r,
            forward,
            k0,
            sigma_squared,
            put_count: puts.len(),
            call_count: calls.len(),
            contributions,
            guards,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strike_intervals_edges_are_single_sided() {
        let dk = strike_intervals(&[90.0, 95.0, 100.0, 110.0]);
        assert_eq!(dk, vec![5.0, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn test_strike_intervals_degenerate() {
        assert!(strike_intervals(&[]).is_empty());
        assert_eq!(strike_intervals(&[100.0]), vec![0.0]);
    }
}
