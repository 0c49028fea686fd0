use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{CalcResult, NumericGuard, VixError};
use crate::models::utils::{MINUTES_AM_SETTLEMENT, MINUTES_PM_SETTLEMENT};

/// Option root symbol. Standard monthly SPX options settle at the open (AM),
/// SPXW weeklies settle at the close (PM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Root {
    #[serde(rename = "SPX")]
    Spx,
    #[serde(rename = "SPXW")]
    Spxw,
}

impl Root {
    /// Minutes after midnight on expiration day at which the root settles.
    pub fn settlement_minutes(&self) -> i64 {
        match self {
            Root::Spx => MINUTES_AM_SETTLEMENT,
            Root::Spxw => MINUTES_PM_SETTLEMENT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Root::Spx => "SPX",
            Root::Spxw => "SPXW",
        }
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Root {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SPX" => Ok(Root::Spx),
            "SPXW" => Ok(Root::Spxw),
            other => Err(format!("unsupported option root: {}", other)),
        }
    }
}

/// One strike of one expiry for one root, with both the call and the put leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub root: Root,
    pub expiry: NaiveDate,
    /// Strike price
    pub strike: f64,
    pub call_bid: f64,
    pub call_ask: f64,
    pub put_bid: f64,
    pub put_ask: f64,
    pub call_volume: u64,
    pub put_volume: u64,
    pub call_open_interest: u64,
    pub put_open_interest: u64,
    /// Implied volatility as decimal, when the exchange published one
    pub call_iv: Option<f64>,
    pub put_iv: Option<f64>,
}

impl OptionQuote {
    /// Call mid price; `None` when there is no bid.
    pub fn call_mid(&self) -> Option<f64> {
        mid(self.call_bid, self.call_ask)
    }

    /// Put mid price; `None` when there is no bid.
    pub fn put_mid(&self) -> Option<f64> {
        mid(self.put_bid, self.put_ask)
    }

    /// Combined bid/ask width of both legs.
    pub fn total_spread(&self) -> f64 {
        (self.call_ask - self.call_bid) + (self.put_ask - self.put_bid)
    }

    fn validate(&self, quote_date: NaiveDate) -> CalcResult<()> {
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(VixError::invalid_input(
                quote_date,
                format!("non-positive strike {} for {} {}", self.strike, self.root, self.expiry),
            ));
        }
        let prices = [self.call_bid, self.call_ask, self.put_bid, self.put_ask];
        if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(VixError::invalid_input(
                quote_date,
                format!(
                    "negative or non-finite price at {} {} strike {}",
                    self.root, self.expiry, self.strike
                ),
            ));
        }
        Ok(())
    }
}

fn mid(bid: f64, ask: f64) -> Option<f64> {
    if bid > 0.0 {
        Some((bid + ask) / 2.0)
    } else {
        None
    }
}

/// All option quotes observed on one quote date, across expiries and roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChainSnapshot {
    pub quote_date: NaiveDate,
    quotes: Vec<OptionQuote>,
}

impl OptionChainSnapshot {
    /// Build a snapshot, ordering quotes by (strike, expiry, root).
    ///
    /// Non-finite strikes sort to the ends and are left for `validate` to reject.
    pub fn new(quote_date: NaiveDate, mut quotes: Vec<OptionQuote>) -> Self {
        quotes.sort_by(|a, b| {
            a.strike
                .total_cmp(&b.strike)
                .then(a.expiry.cmp(&b.expiry))
                .then(a.root.cmp(&b.root))
        });
        Self { quote_date, quotes }
    }

    pub fn quotes(&self) -> &[OptionQuote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Distinct expiries present in the snapshot, ascending.
    pub fn expiries(&self) -> BTreeSet<NaiveDate> {
        self.quotes.iter().map(|q| q.expiry).collect()
    }

    /// Quotes for a single expiry, in strike order.
    pub fn quotes_for(&self, expiry: NaiveDate) -> impl Iterator<Item = &OptionQuote> {
        self.quotes.iter().filter(move |q| q.expiry == expiry)
    }

    /// Reject malformed rows and duplicate (root, expiry, strike) keys.
    pub fn validate(&self) -> CalcResult<()> {
        let mut seen = HashSet::with_capacity(self.quotes.len());
        for quote in &self.quotes {
            quote.validate(self.quote_date)?;
            if !seen.insert((quote.root, quote.expiry, quote.strike.to_bits())) {
                return Err(VixError::invalid_input(
                    self.quote_date,
                    format!(
                        "duplicate quote for {} {} strike {}",
                        quote.root, quote.expiry, quote.strike
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// OTM option leg a strike contributes to the variance sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContributionKind {
    Put,
    /// Average of the call and put mid at K0
    PutCallAverage,
    Call,
}

/// One strike's contribution to a term's generalized variance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrikeContribution {
    pub strike: f64,
    pub kind: ContributionKind,
    pub mid: f64,
    pub delta_k: f64,
    /// `ΔK/K² · e^(RT) · Q(K)`
    pub contribution: f64,
}

/// Result of the variance calculation for one expiry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermResult {
    pub quote_date: NaiveDate,
    pub expiry: NaiveDate,
    /// Root whose settlement convention set the time to expiration
    pub settlement_root: Root,
    /// Calendar days to expiration
    pub dte: i64,
    pub minutes_to_expiry: i64,
    /// Time to expiration in years (minutes / 525,600)
    pub t: f64,
    /// Continuously compounded risk-free rate
    pub r: f64,
    /// Forward index level
    pub forward: f64,
    /// First strike at or below the forward
    pub k0: f64,
    /// Generalized variance σ²
    pub sigma_squared: f64,
    pub put_count: usize,
    pub call_count: usize,
    pub contributions: Vec<StrikeContribution>,
    pub guards: Vec<NumericGuard>,
}

impl TermResult {
    /// Strikes contributing to the variance sum, K0 included.
    pub fn strike_count(&self) -> usize {
        self.contributions.len()
    }
}

/// Pass-through chain aggregates reported next to the index value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionDiagnostics {
    pub call_volume: u64,
    pub put_volume: u64,
    pub put_call_volume_ratio: Option<f64>,
    pub call_open_interest: u64,
    pub put_open_interest: u64,
    pub put_call_oi_ratio: Option<f64>,
    pub avg_call_iv: Option<f64>,
    pub avg_put_iv: Option<f64>,
    pub put_call_iv_ratio: Option<f64>,
    /// Mean of the call and put IV at the near-term K0
    pub atm_iv: Option<f64>,
    /// Mean far-OTM near-term put IV minus ATM IV
    pub otm_put_iv_skew: Option<f64>,
}

/// Final index record for one quote date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VixResult {
    pub quote_date: NaiveDate,
    pub calculated_vix: f64,
    pub expiry1: NaiveDate,
    pub expiry2: NaiveDate,
    pub dte1: i64,
    pub dte2: i64,
    pub t1: f64,
    pub t2: f64,
    pub f1: f64,
    pub f2: f64,
    pub k0_1: f64,
    pub k0_2: f64,
    /// Near-term generalized variance
    pub sigma1: f64,
    /// Next-term generalized variance
    pub sigma2: f64,
    pub r1: f64,
    pub r2: f64,
    pub diagnostics: OptionDiagnostics,
    pub guards: Vec<NumericGuard>,
}

impl VixResult {
    /// True when no numeric guard fired while producing the value.
    pub fn is_clean(&self) -> bool {
        self.guards.is_empty()
    }

    /// Whether the calculated value is within `tolerance` of a published index value.
    pub fn matches_market(&self, market_vix: f64, tolerance: f64) -> bool {
        (self.calculated_vix - market_vix).abs() < tolerance
    }
}
