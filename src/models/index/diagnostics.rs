use statrs::statistics::Statistics;

use crate::calculation::config::DiagnosticsConfig;
use crate::calculation::types::{OptionDiagnostics, OptionQuote};
use crate::models::chain::TermLadder;

fn ratio(num: f64, den: f64) -> Option<f64> {
    (den > 0.0).then(|| num / den)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

fn usable_iv(iv: Option<f64>) -> Option<f64> {
    iv.filter(|v| v.is_finite() && *v > 0.0)
}

/// Chain aggregates over both selected ladders.
///
/// Volumes, open interest and average IVs cover every strike of the near and
/// next ladders. The ATM IV and the OTM put skew come from the near term only,
/// with "far OTM" meaning strikes below `K0 · (1 − otm_put_moneyness)`.
/// Ratios are `None` when their denominator is zero or absent.
pub fn option_diagnostics(
    near: &TermLadder,
    next: &TermLadder,
    near_k0: f64,
    config: &DiagnosticsConfig,
) -> OptionDiagnostics {
    let quotes = || near.quotes().iter().chain(next.quotes());

    let call_volume: u64 = quotes().map(|q| q.call_volume).sum();
    let put_volume: u64 = quotes().map(|q| q.put_volume).sum();
    let call_open_interest: u64 = quotes().map(|q| q.call_open_interest).sum();
    let put_open_interest: u64 = quotes().map(|q| q.put_open_interest).sum();

    let call_ivs: Vec<f64> = quotes().filter_map(|q| usable_iv(q.call_iv)).collect();
    let put_ivs: Vec<f64> = quotes().filter_map(|q| usable_iv(q.put_iv)).collect();
    let avg_call_iv = mean(&call_ivs);
    let avg_put_iv = mean(&put_ivs);
    let put_call_iv_ratio = match (avg_put_iv, avg_call_iv) {
        (Some(p), Some(c)) => ratio(p, c),
        _ => None,
    };

    let atm_iv = near
        .quotes()
        .iter()
        .find(|q| q.strike == near_k0)
        .and_then(atm_iv_at);

    let cutoff = near_k0 * (1.0 - config.otm_put_moneyness);
    let otm_put_ivs: Vec<f64> = near
        .quotes()
        .iter()
        .filter(|q| q.strike < cutoff)
        .filter_map(|q| usable_iv(q.put_iv))
        .collect();
    let otm_put_iv_skew = match (mean(&otm_put_ivs), atm_iv) {
        (Some(otm), Some(atm)) => Some(otm - atm),
        _ => None,
    };

    OptionDiagnostics {
        call_volume,
        put_volume,
        put_call_volume_ratio: ratio(put_volume as f64, call_volume as f64),
        call_open_interest,
        put_open_interest,
        put_call_oi_ratio: ratio(put_open_interest as f64, call_open_interest as f64),
        avg_call_iv,
        avg_put_iv,
        put_call_iv_ratio,
        atm_iv,
        otm_put_iv_skew,
    }
}

fn atm_iv_at(quote: &OptionQuote) -> Option<f64> {
    match (usable_iv(quote.call_iv), usable_iv(quote.put_iv)) {
        (Some(c), Some(p)) => Some((c + p) / 2.0),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}
