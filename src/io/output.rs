use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::calculation::types::VixResult;

/// Flat CSV row for one calculated date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VixRecord {
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
    pub sigma1: f64,
    pub sigma2: f64,
    pub r1: f64,
    pub r2: f64,
    pub call_volume: u64,
    pub put_volume: u64,
    pub put_call_volume_ratio: Option<f64>,
    pub call_oi: u64,
    pub put_oi: u64,
    pub put_call_oi_ratio: Option<f64>,
    pub avg_call_iv: Option<f64>,
    pub avg_put_iv: Option<f64>,
    pub put_call_iv_ratio: Option<f64>,
    pub atm_iv: Option<f64>,
    pub otm_put_iv_skew: Option<f64>,
    /// `;`-separated guard tags, empty when clean
    pub guards: String,
}

impl From<&VixResult> for VixRecord {
    fn from(r: &VixResult) -> Self {
        let d = &r.diagnostics;
        Self {
            quote_date: r.quote_date,
            calculated_vix: r.calculated_vix,
            expiry1: r.expiry1,
            expiry2: r.expiry2,
            dte1: r.dte1,
            dte2: r.dte2,
            t1: r.t1,
            t2: r.t2,
            f1: r.f1,
            f2: r.f2,
            k0_1: r.k0_1,
            k0_2: r.k0_2,
            sigma1: r.sigma1,
            sigma2: r.sigma2,
            r1: r.r1,
            r2: r.r2,
            call_volume: d.call_volume,
            put_volume: d.put_volume,
            put_call_volume_ratio: d.put_call_volume_ratio,
            call_oi: d.call_open_interest,
            put_oi: d.put_open_interest,
            put_call_oi_ratio: d.put_call_oi_ratio,
            avg_call_iv: d.avg_call_iv,
            avg_put_iv: d.avg_put_iv,
            put_call_iv_ratio: d.put_call_iv_ratio,
            atm_iv: d.atm_iv,
            otm_put_iv_skew: d.otm_put_iv_skew,
            guards: r
                .guards
                .iter()
                .map(|g| g.tag())
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

/// Write one CSV row per result to any writer, header included.
pub fn write_results_to<W: Write>(writer: W, results: &[VixResult]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for result in results {
        wtr.serialize(VixRecord::from(result))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_results(path: impl AsRef<Path>, results: &[VixResult]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    write_results_to(file, results)
        .with_context(|| format!("failed to write results to {}", path.display()))
}
