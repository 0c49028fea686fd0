use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::utils::{MINUTES_PER_DAY, MINUTES_PM_SETTLEMENT};

/// Rule deciding which root wins when SPX and SPXW both quote the same strike
/// of the same expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootPriority {
    /// Smaller combined call+put bid/ask width wins; ties go to SPXW
    #[default]
    TighterSpread,
    PreferSpxw,
    PreferSpx,
}

/// Expiration selection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Minimum minutes to expiration for a candidate expiry (24h by default)
    pub min_minutes_to_expiry: i64,
    /// Lower bound of the calendar-day window (inclusive)
    pub min_days: Option<i64>,
    /// Upper bound of the calendar-day window (inclusive)
    pub max_days: Option<i64>,
    /// Keep only Friday expirations
    pub fridays_only: bool,
    pub root_priority: RootPriority,
    /// Snapshot time as minutes after midnight
    pub quote_time_minutes: i64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_minutes_to_expiry: MINUTES_PER_DAY,
            min_days: None,
            max_days: None,
            fridays_only: false,
            root_priority: RootPriority::default(),
            quote_time_minutes: MINUTES_PM_SETTLEMENT,
        }
    }
}

/// Strike-ladder settings for the per-term variance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermConfig {
    /// Minimum OTM strikes required on each side of K0
    pub min_strikes_per_side: usize,
    /// Consecutive zero bids that end a wing's walk
    pub zero_bid_truncation: usize,
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            min_strikes_per_side: 2,
            zero_bid_truncation: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Puts struck below `K0 * (1 - otm_put_moneyness)` count as far OTM
    pub otm_put_moneyness: f64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            otm_put_moneyness: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    /// Widest gap (calendar days) to a neighbouring curve when the quote date
    /// has no published yields of its own
    pub max_gap_days: i64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self { max_gap_days: 5 }
    }
}

/// Main configuration struct for the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VixConfig {
    pub selection: SelectionConfig,
    pub term: TermConfig,
    pub diagnostics: DiagnosticsConfig,
    pub rates: RateConfig,
}

impl VixConfig {
    /// Earliest expiry at least 24 hours out, then the next one.
    pub fn standard() -> Self {
        Self::default()
    }

    /// CBOE window: both terms between 23 and 37 calendar days.
    pub fn cboe() -> Self {
        Self {
            selection: SelectionConfig {
                min_days: Some(23),
                max_days: Some(37),
                ..SelectionConfig::default()
            },
            ..Self::default()
        }
    }

    /// Friday-only expirations strictly between 22 and 38 days out.
    pub fn legacy_fridays() -> Self {
        Self {
            selection: SelectionConfig {
                min_days: Some(23),
                max_days: Some(37),
                fridays_only: true,
                ..SelectionConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to parse VIX configuration")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
    }
}
