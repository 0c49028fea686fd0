
use test_utils::date;
use vix_lib::models::rates::bey_to_continuous;
use vix_lib::{NumericGuard, RateBook, RateCurve, RateSource, VixError};

fn cmt_curve() -> RateCurve {
    RateCurve::from_labels(
        date(2024, 1, 2),
        [
            ("1 Mo", 0.0555),
            ("2 Mo", 0.0554),
            ("3 Mo", 0.0546),
            ("6 Mo", 0.0524),
            ("1 Yr", 0.0480),
        ],
    )
    .expect("valid labels")
}

/// Maturities past the longest tenor reuse the longest tenor's rate exactly.
#[test]
fn test_rate_beyond_longest_tenor_equals_longest() {
    let curve = cmt_curve();
    let at_longest = curve.rate(364.0 / 365.0).unwrap();
    for years in [1.5, 3.0, 10.0] {
        let beyond = curve.rate(years).unwrap();
        assert_eq!(beyond, at_longest, "rate at {} years should be clamped", years);
    }

    let interp = curve.interpolate(3.0).unwrap();
    assert_eq!(interp.clamped_to, Some(364));
    assert!(matches!(
        interp.guard(),
        Some(NumericGuard::RateClamped { tenor_days: 364, .. })
    ));
}

#[test]
fn test_rate_below_shortest_tenor_is_clamped() {
    let curve = cmt_curve();
    assert_eq!(curve.shortest_tenor(), Some(30));
    assert_eq!(curve.longest_tenor(), Some(364));
    assert_eq!(RateCurve::new(date(2024, 1, 2), Vec::new()).shortest_tenor(), None);
    let short = curve.interpolate(9.0 / 365.0).unwrap();
    assert_eq!(short.clamped_to, Some(30));
    assert_eq!(short.rate, curve.rate(30.0 / 365.0).unwrap());
}

#[test]
fn test_linear_interpolation_then_continuous_conversion() {
    let curve = cmt_curve();
    // 75 days sits between the 2 Mo and 3 Mo tenors
    let w = (75.0 - 60.0) / (91.0 - 60.0);
    let expected_yield = 0.0554 + (0.0546 - 0.0554) * w;

    let r = curve.interpolate(75.0 / 365.0).unwrap();
    assert!(r.clamped_to.is_none());
    assert!(
        (r.par_yield - expected_yield).abs() < 1e-12,
        "par yield {} vs {}",
        r.par_yield,
        expected_yield
    );
    assert!((r.rate - bey_to_continuous(expected_yield)).abs() < 1e-15);
    assert!(r.rate < r.par_yield, "continuous rate sits below the BEY");
}

#[test]
fn test_unknown_label_rejected() {
    let err = RateCurve::from_labels(date(2024, 1, 2), [("1 Mo", 0.05), ("8 Wk", 0.05)]);
    assert!(err.is_err());
}

#[test]
fn test_empty_curve_is_missing_rate_data() {
    let curve = RateCurve::new(date(2024, 1, 2), Vec::new());
    assert!(matches!(
        curve.interpolate(0.1),
        Err(VixError::MissingRateData { .. })
    ));
    assert!(curve.curve_for(date(2024, 1, 2)).is_err());
}

#[test]
fn test_rate_book_exact_and_missing_dates() {
    let book: RateBook = vec![
        test_utils::flat_curve(date(2024, 1, 2), 0.05),
        test_utils::flat_curve(date(2024, 1, 3), 0.051),
    ]
    .into_iter()
    .collect();

    let exact = book.curve_for(date(2024, 1, 3)).unwrap();
    assert_eq!(exact.par_yield_at(30), Some(0.051));

    // Nothing after Jan 3rd to blend with
    match book.curve_for(date(2024, 1, 4)) {
        Err(VixError::MissingRateData { quote_date, .. }) => {
            assert_eq!(quote_date, date(2024, 1, 4))
        }
        other => panic!("expected MissingRateData, got {:?}", other),
    }
}
