use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::calculation::types::{OptionChainSnapshot, OptionQuote, Root};
use crate::models::rates::{tenor_days, RateBook, RateCurve};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y%m%d"];

/// Parse a calendar date in any of the layouts found in CBOE and Treasury files.
/// A trailing time component (`2024-01-02 16:00:00`) is ignored.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let text = raw.trim();
    let day = text.split(|c: char| c == ' ' || c == 'T').next().unwrap_or(text);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
        .ok_or_else(|| anyhow!("unrecognised date: {:?}", raw))
}

/// One row of the end-of-day option file (call and put legs side by side).
#[derive(Debug, Deserialize)]
struct OptionRow {
    quote_date: String,
    root: String,
    #[serde(alias = "expiration")]
    expiry: String,
    strike: f64,
    #[serde(rename = "bid_1545_c")]
    call_bid: f64,
    #[serde(rename = "ask_1545_c")]
    call_ask: f64,
    #[serde(rename = "bid_1545_p")]
    put_bid: f64,
    #[serde(rename = "ask_1545_p")]
    put_ask: f64,
    #[serde(rename = "trade_volume_c", default)]
    call_volume: Option<u64>,
    #[serde(rename = "trade_volume_p", default)]
    put_volume: Option<u64>,
    #[serde(rename = "open_interest_c", default)]
    call_open_interest: Option<u64>,
    #[serde(rename = "open_interest_p", default)]
    put_open_interest: Option<u64>,
    #[serde(rename = "implied_volatility_1545_c", default)]
    call_iv: Option<f64>,
    #[serde(rename = "implied_volatility_1545_p", default)]
    put_iv: Option<f64>,
}

impl OptionRow {
    fn into_quote(self) -> Result<(NaiveDate, OptionQuote)> {
        let quote_date = parse_date(&self.quote_date)?;
        let root: Root = self.root.parse().map_err(|e: String| anyhow!(e))?;
        let expiry = parse_date(&self.expiry)?;
        Ok((
            quote_date,
            OptionQuote {
                root,
                expiry,
                strike: self.strike,
                call_bid: self.call_bid,
                call_ask: self.call_ask,
                put_bid: self.put_bid,
                put_ask: self.put_ask,
                call_volume: self.call_volume.unwrap_or(0),
                put_volume: self.put_volume.unwrap_or(0),
                call_open_interest: self.call_open_interest.unwrap_or(0),
                put_open_interest: self.put_open_interest.unwrap_or(0),
                call_iv: self.call_iv,
                put_iv: self.put_iv,
            },
        ))
    }
}

/// Read option rows from any reader and group them into per-date snapshots.
pub fn read_snapshots<R: Read>(reader: R) -> Result<BTreeMap<NaiveDate, OptionChainSnapshot>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut by_date: BTreeMap<NaiveDate, Vec<OptionQuote>> = BTreeMap::new();

    for (line, row) in rdr.deserialize::<OptionRow>().enumerate() {
        // header is line 1
        let row = row.with_context(|| format!("bad option row at line {}", line + 2))?;
        let (quote_date, quote) = row
            .into_quote()
            .with_context(|| format!("bad option row at line {}", line + 2))?;
        by_date.entry(quote_date).or_default().push(quote);
    }

    Ok(by_date
        .into_iter()
        .map(|(date, quotes)| (date, OptionChainSnapshot::new(date, quotes)))
        .collect())
}

/// Load an end-of-day option file into one snapshot per quote date.
pub fn load_snapshots(path: impl AsRef<Path>) -> Result<BTreeMap<NaiveDate, OptionChainSnapshot>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open option file {}", path.display()))?;
    let snapshots = read_snapshots(file)
        .with_context(|| format!("failed to read option file {}", path.display()))?;
    info!(
        path = %path.display(),
        dates = snapshots.len(),
        "loaded option snapshots"
    );
    Ok(snapshots)
}

/// Read a Treasury par-yield table: a `Date` column plus one column per tenor
/// label, yields in percent. Blank cells are skipped and unknown columns ignored;
/// a row with no values at all is dropped so the date blends from its neighbours.
pub fn read_rate_book<R: Read>(reader: R, max_gap_days: i64) -> Result<RateBook> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let date_col = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("date"))
        .context("par-yield table has no date column")?;
    let tenor_cols: Vec<(usize, u32)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_col)
        .filter_map(|(i, h)| match tenor_days(h) {
            Some(days) => Some((i, days)),
            None => {
                debug!(column = h, "ignoring non-tenor column");
                None
            }
        })
        .collect();
    if tenor_cols.is_empty() {
        bail!("par-yield table has no recognised tenor columns");
    }

    let mut book = RateBook::new(max_gap_days);
    for record in rdr.records() {
        let record = record?;
        let raw_date = record.get(date_col).unwrap_or_default();
        let date = parse_date(raw_date)?;

        let mut points = Vec::with_capacity(tenor_cols.len());
        for &(col, days) in &tenor_cols {
            let cell = record.get(col).unwrap_or_default().trim();
            if cell.is_empty() || cell.eq_ignore_ascii_case("n/a") {
                continue;
            }
            let pct: f64 = cell
                .parse()
                .with_context(|| format!("bad yield {:?} on {}", cell, date))?;
            points.push((days, pct / 100.0));
        }
        if points.is_empty() {
            debug!(%date, "par-yield row has no values, skipped");
            continue;
        }
        book.insert(RateCurve::new(date, points));
    }
    Ok(book)
}

pub fn load_rate_book(path: impl AsRef<Path>, max_gap_days: i64) -> Result<RateBook> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open par-yield file {}", path.display()))?;
    let book = read_rate_book(file, max_gap_days)
        .with_context(|| format!("failed to read par-yield file {}", path.display()))?;
    info!(path = %path.display(), curves = book.len(), "loaded treasury curves");
    Ok(book)
}

#[derive(Debug, Deserialize)]
struct MarketRow {
    #[serde(alias = "Date", alias = "DATE")]
    date: String,
    #[serde(alias = "close", alias = "CLOSE", alias = "VIX")]
    vix: f64,
}

/// Read published index values as `date,vix` rows.
pub fn read_market_vix<R: Read>(reader: R) -> Result<BTreeMap<NaiveDate, f64>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut out = BTreeMap::new();
    for row in rdr.deserialize::<MarketRow>() {
        let row = row?;
        out.insert(parse_date(&row.date)?, row.vix);
    }
    Ok(out)
}

pub fn load_market_vix(path: impl AsRef<Path>) -> Result<BTreeMap<NaiveDate, f64>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open market VIX file {}", path.display()))?;
    read_market_vix(file).with_context(|| format!("failed to read market VIX file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_layouts() {
        let want = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(parse_date("2024-01-02").unwrap(), want);
        assert_eq!(parse_date("01/02/2024").unwrap(), want);
        assert_eq!(parse_date("20240102").unwrap(), want);
        assert_eq!(parse_date("2024-01-02 16:00:00").unwrap(), want);
        assert!(parse_date("Jan 2").is_err());
    }
}
