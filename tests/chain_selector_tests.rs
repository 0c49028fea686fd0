
use chrono::Duration;
use test_utils::{date, quote};
use vix_lib::models::utils::MINUTES_PER_DAY;
use vix_lib::{
    ChainSelector, OptionChainSnapshot, OptionQuote, RootPriority, Root, SelectionConfig,
    VixError,
};

fn strip(root: Root, expiry: chrono::NaiveDate) -> Vec<OptionQuote> {
    [4450.0, 4475.0, 4500.0, 4525.0, 4550.0]
        .into_iter()
        .map(|k| quote(root, expiry, k, (10.0, 10.5), (10.0, 10.5)))
        .collect()
}

fn snapshot_with(quote_date: chrono::NaiveDate, days: &[i64]) -> OptionChainSnapshot {
    let quotes = days
        .iter()
        .flat_map(|d| strip(Root::Spxw, quote_date + Duration::days(*d)))
        .collect();
    OptionChainSnapshot::new(quote_date, quotes)
}

#[test]
fn test_picks_earliest_two_expiries() {
    let qd = date(2024, 1, 2);
    let snapshot = snapshot_with(qd, &[45, 9, 16, 2]);
    let pair = ChainSelector::default().select(&snapshot).unwrap();

    assert_eq!(pair.near.expiry, qd + Duration::days(2));
    assert_eq!(pair.next.expiry, qd + Duration::days(9));
    assert_eq!(pair.near.len(), 5);
}

#[test]
fn test_expiry_inside_a_day_is_discarded() {
    let qd = date(2024, 1, 2);
    let snapshot = snapshot_with(qd, &[1, 8, 15]);

    // Quoted at 16:40, tomorrow's PM settlement is 23h20m away
    let config = SelectionConfig {
        quote_time_minutes: 1000,
        ..SelectionConfig::default()
    };
    let pair = ChainSelector::new(config).select(&snapshot).unwrap();
    assert_eq!(pair.near.expiry, qd + Duration::days(8));
    assert_eq!(pair.next.expiry, qd + Duration::days(15));

    // At the close it is exactly 24h and qualifies
    let pair = ChainSelector::default().select(&snapshot).unwrap();
    assert_eq!(pair.near.expiry, qd + Duration::days(1));
    assert_eq!(pair.near.minutes_to_expiry, MINUTES_PER_DAY);
}

#[test]
fn test_single_expiry_is_insufficient() {
    let qd = date(2024, 1, 2);
    let snapshot = snapshot_with(qd, &[30]);
    match ChainSelector::default().select(&snapshot) {
        Err(VixError::InsufficientExpirations { quote_date, found }) => {
            assert_eq!(quote_date, qd);
            assert_eq!(found, 1);
        }
        other => panic!("expected InsufficientExpirations, got {:?}", other),
    }

    // Expiries on or before the quote date never count
    let stale = snapshot_with(qd, &[-3, 0, 30]);
    assert!(matches!(
        ChainSelector::default().select(&stale),
        Err(VixError::InsufficientExpirations { found: 1, .. })
    ));
}

#[test]
fn test_day_window_and_friday_filter() {
    // Tuesday quote date
    let qd = date(2024, 1, 2);
    // +24 is Friday Jan 26th, +31 Friday Feb 2nd, +27 a Monday
    let snapshot = snapshot_with(qd, &[10, 24, 27, 31, 40]);

    let window = SelectionConfig {
        min_days: Some(23),
        max_days: Some(37),
        ..SelectionConfig::default()
    };
    let candidates = ChainSelector::new(window.clone()).candidate_expiries(&snapshot);
    let days: Vec<i64> = candidates.iter().map(|e| (*e - qd).num_days()).collect();
    assert_eq!(days, vec![24, 27, 31]);

    let fridays = SelectionConfig {
        fridays_only: true,
        ..window
    };
    let pair = ChainSelector::new(fridays).select(&snapshot).unwrap();
    assert_eq!(pair.near.expiry, date(2024, 1, 26));
    assert_eq!(pair.next.expiry, date(2024, 2, 2));
}

#[test]
fn test_root_pooling_and_settlement() {
    let qd = date(2024, 1, 2);
    let expiry = date(2024, 1, 19);
    let next = date(2024, 1, 26);

    let mut quotes = strip(Root::Spx, expiry);
    // SPXW duplicates two strikes with a tighter market
    quotes.push(quote(Root::Spxw, expiry, 4475.0, (10.1, 10.3), (10.1, 10.3)));
    quotes.push(quote(Root::Spxw, expiry, 4500.0, (10.1, 10.3), (10.1, 10.3)));
    quotes.extend(strip(Root::Spxw, next));
    let snapshot = OptionChainSnapshot::new(qd, quotes);

    let selector = ChainSelector::default();
    let ladder = selector.build_ladder(&snapshot, expiry).unwrap();
    let roots: Vec<Root> = ladder.quotes().iter().map(|q| q.root).collect();
    assert_eq!(
        roots,
        vec![Root::Spx, Root::Spxw, Root::Spxw, Root::Spx, Root::Spx]
    );
    // SPX supplies three of five strikes, so the ladder settles AM
    assert_eq!(ladder.settlement_root, Root::Spx);
    assert_eq!(ladder.minutes_to_expiry, 17 * MINUTES_PER_DAY - 390);

    let spx_first = ChainSelector::new(SelectionConfig {
        root_priority: RootPriority::PreferSpx,
        ..SelectionConfig::default()
    });
    let ladder = spx_first.build_ladder(&snapshot, expiry).unwrap();
    assert!(ladder.quotes().iter().all(|q| q.root == Root::Spx));

    let spxw_first = ChainSelector::new(SelectionConfig {
        root_priority: RootPriority::PreferSpxw,
        ..SelectionConfig::default()
    });
    let ladder = spxw_first.build_ladder(&snapshot, expiry).unwrap();
    assert_eq!(ladder.quotes()[1].root, Root::Spxw);
    assert!(ladder
        .strikes()
        .collect::<Vec<_>>()
        .windows(2)
        .all(|w| w[0] < w[1]));
}
