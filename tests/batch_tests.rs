
use chrono::Duration;
use std::collections::BTreeMap;
use test_utils::{collapsing_snapshot, date, flat_curve, two_term_snapshot};
use vix_lib::{default_configs, run_batch, OptionChainSnapshot, RateBook, TermConfig, VixConfig, VixError};

fn book_for(dates: &[chrono::NaiveDate]) -> RateBook {
    dates.iter().map(|d| flat_curve(*d, 0.05)).collect()
}

#[test]
fn test_failed_dates_are_skipped_not_emitted() {
    let good1 = date(2024, 3, 1);
    let bad = date(2024, 3, 4);
    let good2 = date(2024, 3, 5);

    let lonely: Vec<_> = two_term_snapshot(bad)
        .quotes()
        .iter()
        .filter(|q| q.expiry == bad + Duration::days(23))
        .cloned()
        .collect();
    let snapshots = vec![
        two_term_snapshot(good1),
        OptionChainSnapshot::new(bad, lonely),
        two_term_snapshot(good2),
    ];

    let report = run_batch(
        &snapshots,
        &book_for(&[good1, bad, good2]),
        default_configs::standard(),
    );

    assert_eq!(report.total(), 3);
    let dates: Vec<_> = report.results.iter().map(|r| r.quote_date).collect();
    assert_eq!(dates, vec![good1, good2]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].quote_date, bad);
    assert!(matches!(
        report.skipped[0].error,
        VixError::InsufficientExpirations { found: 1, .. }
    ));
    assert!(report
        .results
        .iter()
        .all(|r| r.calculated_vix.is_finite() && r.calculated_vix > 0.0));
}

#[test]
fn test_missing_rates_only_skip_their_own_date() {
    let d1 = date(2024, 3, 1);
    let d2 = date(2024, 3, 20);
    let snapshots = [two_term_snapshot(d1), two_term_snapshot(d2)];

    // Only March 1st has a curve, and March 20th is too far to borrow it
    let report = run_batch(&snapshots, &book_for(&[d1]), default_configs::standard());
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].quote_date, d1);
    assert!(matches!(
        report.skipped[0].error,
        VixError::MissingRateData { quote_date, .. } if quote_date == d2
    ));
}

#[test]
fn test_compare_with_market_values() {
    let d1 = date(2024, 3, 1);
    let d2 = date(2024, 3, 5);
    let snapshots = [two_term_snapshot(d1), two_term_snapshot(d2)];
    let report = run_batch(&snapshots, &book_for(&[d1, d2]), default_configs::standard());
    assert_eq!(report.results.len(), 2);

    let vix1 = report.results[0].calculated_vix;
    let vix2 = report.results[1].calculated_vix;
    let market: BTreeMap<_, _> = [
        (d1, vix1 + 0.005),
        (d2, vix2 - 0.5),
        // no calculated value for this one
        (date(2024, 3, 6), 20.0),
    ]
    .into_iter()
    .collect();

    let summary = report.compare_with(&market).unwrap();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.max_diff_date, d2);
    assert!((summary.max_abs_diff - 0.5).abs() < 1e-9);
    assert!((summary.mean_abs_diff - 0.2525).abs() < 1e-9);
    assert_eq!(summary.pct_within_001, 50.0);
    assert_eq!(summary.pct_within_01, 50.0);

    assert!(report.compare_with(&BTreeMap::new()).is_none());
}

#[test]
fn test_degenerate_variance_date_is_skipped() {
    let good = date(2024, 3, 1);
    let collapsed = date(2024, 3, 4);
    let snapshots = [two_term_snapshot(good), collapsing_snapshot(collapsed)];
    let config = VixConfig {
        term: TermConfig {
            min_strikes_per_side: 0,
            ..TermConfig::default()
        },
        ..VixConfig::default()
    };

    let report = run_batch(&snapshots, &book_for(&[good, collapsed]), config);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].quote_date, good);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].quote_date, collapsed);
    assert!(matches!(
        report.skipped[0].error,
        VixError::DegenerateVariance { .. }
    ));
}
