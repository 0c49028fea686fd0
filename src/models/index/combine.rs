use crate::calculation::types::TermResult;
use crate::error::{CalcResult, VixError};
use crate::models::utils::{MINUTES_30_DAYS, MINUTES_PER_YEAR};

/// Weights applied to the near and next term when interpolating to 30 days.
///
/// `w1 = (N2 − N30)/(N2 − N1)`, `w2 = (N30 − N1)/(N2 − N1)`; they always sum to one
/// but fall outside [0, 1] when both terms sit on the same side of 30 days.
pub fn term_weights(near_minutes: i64, next_minutes: i64) -> (f64, f64) {
    let n1 = near_minutes as f64;
    let n2 = next_minutes as f64;
    let n30 = MINUTES_30_DAYS as f64;
    let span = n2 - n1;
    ((n2 - n30) / span, (n30 - n1) / span)
}

/// Annualized 30-day variance:
/// `(T1σ1²·w1 + T2σ2²·w2) · N365/N30`.
pub fn thirty_day_variance(near: &TermResult, next: &TermResult) -> f64 {
    let (w1, w2) = term_weights(near.minutes_to_expiry, next.minutes_to_expiry);
    let n365 = MINUTES_PER_YEAR as f64;
    let n30 = MINUTES_30_DAYS as f64;
    (near.t * near.sigma_squared * w1 + next.t * next.sigma_squared * w2) * n365 / n30
}

/// Index value `100 · sqrt(30-day variance)`.
///
/// The weighting is applied unmodified whatever side of 30 days the terms fall on;
/// a variance that is not strictly positive and finite is rejected rather than
/// turned into an index level.
pub fn vix_from_terms(near: &TermResult, next: &TermResult) -> CalcResult<f64> {
    if next.minutes_to_expiry <= near.minutes_to_expiry {
        return Err(VixError::invalid_input(
            near.quote_date,
            format!(
                "next-term {} does not expire after near-term {}",
                next.expiry, near.expiry
            ),
        ));
    }

    let variance = thirty_day_variance(near, next);
    if !(variance.is_finite() && variance > 0.0) {
        return Err(VixError::DegenerateVariance {
            quote_date: near.quote_date,
            variance,
        });
    }
    Ok(100.0 * variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::utils::MINUTES_PER_DAY;

    #[test]
    fn test_weights_bracketing_30_days() {
        let (w1, w2) = term_weights(23 * MINUTES_PER_DAY, 37 * MINUTES_PER_DAY);
        assert!((w1 - 0.5).abs() < 1e-12);
        assert!((w2 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_weights_both_terms_beyond_30_days() {
        let (w1, w2) = term_weights(35 * MINUTES_PER_DAY, 42 * MINUTES_PER_DAY);
        assert!(w1 > 1.0);
        assert!(w2 < 0.0);
        assert!((w1 + w2 - 1.0).abs() < 1e-12);
    }
}
