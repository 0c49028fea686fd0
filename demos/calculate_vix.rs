use chrono::{Duration, NaiveDate};
use statrs::distribution::{ContinuousCDF, Normal};
use vix_lib::{
    calculate_vix, default_configs, OptionChainSnapshot, OptionQuote, RateCurve, Root,
};

/// Black-Scholes call and put on a forward, used to fake a flat-vol chain.
fn bs_prices(forward: f64, strike: f64, vol: f64, t: f64, r: f64) -> (f64, f64) {
    let n = Normal::new(0.0, 1.0).unwrap();
    let sd = vol * t.sqrt();
    let d1 = ((forward / strike).ln() + 0.5 * sd * sd) / sd;
    let d2 = d1 - sd;
    let df = (-r * t).exp();
    let call = df * (forward * n.cdf(d1) - strike * n.cdf(d2));
    let put = df * (strike * n.cdf(-d2) - forward * n.cdf(-d1));
    (call, put)
}

fn chain_for(expiry: NaiveDate, days: f64, root: Root, spot: f64, vol: f64) -> Vec<OptionQuote> {
    let t = days / 365.0;
    let r = 0.045;
    let forward = spot * (r * t).exp();
    let mut quotes = Vec::new();

    let mut strike = 3800.0;
    while strike <= 5400.0 {
        let (call, put) = bs_prices(forward, strike, vol, t, r);
        // a nickel either side, zero bid once the option is worth under 5 cents
        let leg = |px: f64| if px < 0.05 { (0.0, 0.05) } else { (px - 0.05, px + 0.05) };
        let (call_bid, call_ask) = leg(call);
        let (put_bid, put_ask) = leg(put);
        quotes.push(OptionQuote {
            root,
            expiry,
            strike,
            call_bid,
            call_ask,
            put_bid,
            put_ask,
            call_volume: 100,
            put_volume: 150,
            call_open_interest: 1_000,
            put_open_interest: 1_800,
            call_iv: Some(vol),
            put_iv: Some(vol + if strike < spot { 0.02 } else { 0.0 }),
        });
        strike += 25.0;
    }
    quotes
}

fn main() -> anyhow::Result<()> {
    println!("VIX Calculation Demo");
    println!("====================");

    let quote_date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let near = quote_date + Duration::days(23);
    let next = quote_date + Duration::days(37);
    let vol = 0.18;

    let mut quotes = chain_for(near, 23.0, Root::Spxw, 4500.0, vol);
    quotes.extend(chain_for(next, 37.0, Root::Spxw, 4500.0, vol));
    let snapshot = OptionChainSnapshot::new(quote_date, quotes);

    let curve = RateCurve::from_labels(
        quote_date,
        [("1mo", 4.55), ("2mo", 4.58), ("3mo", 4.60), ("6mo", 4.52)]
            .into_iter()
            .map(|(label, pct)| (label, pct / 100.0)),
    )
    .map_err(anyhow::Error::msg)?;

    let result = calculate_vix(&snapshot, &curve, default_configs::cboe())?;

    println!("Quote date:   {}", result.quote_date);
    println!("Near term:    {} ({} days), F = {:.2}, K0 = {}", result.expiry1, result.dte1, result.f1, result.k0_1);
    println!("Next term:    {} ({} days), F = {:.2}, K0 = {}", result.expiry2, result.dte2, result.f2, result.k0_2);
    println!("Rates:        R1 = {:.5}, R2 = {:.5}", result.r1, result.r2);
    println!("Variances:    σ1² = {:.6}, σ2² = {:.6}", result.sigma1, result.sigma2);
    println!("VIX:          {:.2} (input vol {:.0}%)", result.calculated_vix, vol * 100.0);
    println!("Put/call vol: {:?}", result.diagnostics.put_call_volume_ratio);
    println!("OTM put skew: {:?}", result.diagnostics.otm_put_iv_skew);
    println!("Clean:        {}", result.is_clean());

    Ok(())
}
