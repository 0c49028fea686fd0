//! # VIX-Lib: CBOE Volatility Index Calculation Engine
//!
//! `vix-lib` reproduces the CBOE VIX methodology from end-of-day SPX/SPXW option
//! chains and daily Treasury par-yield curves. For each quote date it selects a
//! near-term and a next-term expiration, computes the generalized variance of each
//! from out-of-the-money option prices, and interpolates the two to a constant
//! 30-day horizon.
//!
//! ## Core Features
//!
//! - **Expiration selection**: near/next-term choice with SPX/SPXW root pooling
//! - **Rate interpolation**: CMT par yields turned into continuously compounded rates
//! - **Term variance**: forward, K0, zero-bid truncation and per-strike contributions
//! - **Batch runs**: fail-closed per date, with skipped dates reported and logged
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vix_lib::{calculate_vix, default_configs, io};
//!
//! let snapshots = io::load_snapshots("options.csv")?;
//! let rates = io::load_rate_book("par_yields.csv", 5)?;
//!
//! for snapshot in snapshots.values() {
//!     let result = calculate_vix(snapshot, &rates, default_configs::standard())?;
//!     println!("{} VIX {:.2}", result.quote_date, result.calculated_vix);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Configuration Presets
//!
//! - `standard()`: earliest expiry at least one day out, then the next one
//! - `cboe()`: both terms inside the 23 to 37 day window
//! - `legacy_fridays()`: standard Friday expirations inside the same window

// ================================================================================================
// MODULES
// ================================================================================================

pub mod calculation;
pub mod error;
pub mod io;
pub mod models;

// ================================================================================================
// IMPORTS
// ================================================================================================

use anyhow::Result;

// ================================================================================================
// PUBLIC RE-EXPORTS
// ================================================================================================

// Inputs, outputs and configuration
pub use calculation::{
    config::{DiagnosticsConfig, RateConfig, RootPriority, SelectionConfig, TermConfig, VixConfig},
    types::{
        ContributionKind, OptionChainSnapshot, OptionDiagnostics, OptionQuote, Root,
        StrikeContribution, TermResult, VixResult,
    },
    BatchReport, ComparisonSummary, SkippedDate, VixEngine,
};

// Error taxonomy
pub use error::{CalcResult, LadderSide, NumericGuard, TermKind, VixError};

// Components
pub use models::{
    chain::{ChainSelector, ExpiryPair, TermLadder},
    rates::{RateBook, RateCurve},
    term::TermCalculator,
    traits::RateSource,
};

// ================================================================================================
// DEFAULT CONFIGURATIONS
// ================================================================================================

/// Pre-configured engine settings.
///
/// # Available Configurations
///
/// - [`standard()`]: literal near/next-term rule
/// - [`cboe()`]: 23 to 37 calendar-day window
/// - [`legacy_fridays()`]: Friday expirations inside the same window
pub mod default_configs {
    use crate::calculation::config::VixConfig;

    /// Near-term is the earliest expiration at least 24 hours out; next-term is
    /// the one right after it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use vix_lib::default_configs;
    ///
    /// let config = default_configs::standard();
    /// assert_eq!(config.selection.min_minutes_to_expiry, 1440);
    /// ```
    pub fn standard() -> VixConfig {
        VixConfig::standard()
    }

    /// Both terms must expire between 23 and 37 calendar days after the quote date,
    /// so the pair brackets the 30-day target whenever the listing allows.
    ///
    /// # Example
    ///
    /// ```rust
    /// use vix_lib::default_configs;
    ///
    /// let config = default_configs::cboe();
    /// assert_eq!(config.selection.min_days, Some(23));
    /// assert_eq!(config.selection.max_days, Some(37));
    /// ```
    pub fn cboe() -> VixConfig {
        VixConfig::cboe()
    }

    /// Same window as [`cboe()`], restricted to Friday expirations.
    pub fn legacy_fridays() -> VixConfig {
        VixConfig::legacy_fridays()
    }
}

/// Calculate the VIX for a single quote date.
///
/// # Arguments
///
/// * `snapshot` - All SPX/SPXW quotes observed on the quote date.
/// * `rates` - Any [`RateSource`]: a single [`RateCurve`] or a dated [`RateBook`].
/// * `config` - Engine configuration. Use [`default_configs`] for common presets.
///
/// # Errors
///
/// Returns the typed [`VixError`] (wrapped in `anyhow`) when fewer than two
/// expirations qualify, the curve is missing, a term lacks OTM strikes, the
/// combined variance is degenerate or the snapshot is malformed.
///
/// # Example
///
/// ```rust,no_run
/// use vix_lib::{calculate_vix, default_configs, OptionChainSnapshot, RateCurve};
///
/// # fn load() -> (OptionChainSnapshot, RateCurve) { unimplemented!() }
/// let (snapshot, curve) = load();
/// let result = calculate_vix(&snapshot, &curve, default_configs::cboe())?;
/// if !result.is_clean() {
///     eprintln!("guards fired: {:?}", result.guards);
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn calculate_vix<R>(
    snapshot: &OptionChainSnapshot,
    rates: &R,
    config: VixConfig,
) -> Result<VixResult>
where
    R: RateSource + ?Sized,
{
    let engine = VixEngine::new(config);
    Ok(engine.calculate(snapshot, rates)?)
}

/// Calculate every snapshot independently.
///
/// Dates that fail are logged and listed in [`BatchReport::skipped`] with their
/// error; no partial record is ever emitted.
pub fn run_batch<'a, R, I>(snapshots: I, rates: &R, config: VixConfig) -> BatchReport
where
    R: RateSource + ?Sized,
    I: IntoIterator<Item = &'a OptionChainSnapshot>,
{
    let engine = VixEngine::new(config);
    calculation::pipeline::run_batch(&engine, snapshots, rates)
}
